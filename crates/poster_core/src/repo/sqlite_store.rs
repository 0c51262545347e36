//! SQLite-backed store.
//!
//! # Responsibility
//! - Persist users, posts, comments and commentables in the migrated schema.
//! - Serve lazy collections with the same ordering and failure behavior as
//!   the in-memory backend.
//!
//! # Invariants
//! - Every write runs in one IMMEDIATE transaction covering its existence
//!   checks, id allocation and inserts; any failure rolls everything back.
//! - Batch reads issue one query per realization, outer-joining the requested
//!   ids so each position yields exactly one element.
//! - Cursor rows are resolved inside the same filter as the listing; a cursor
//!   outside it is NotFound.

use crate::collection::{try_map, BoxCollection, Cursor, PeekCollection, ScanCollection};
use crate::db::migrations::{latest_version, schema_version};
use crate::model::comment::{Comment, CommentId, NewComment};
use crate::model::post::{NewPost, Post, PostId};
use crate::model::target::{CommentableId, Target, TargetKind};
use crate::model::user::{NewUser, User, UserId};
use crate::repo::error::{EntityKind, RepoError, RepoResult};
use crate::repo::ids::allocate_id;
use crate::repo::{CommentRepository, OrderKey, PostRepository, SortOrder, UserRepository};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, InterruptHandle, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use uuid::Uuid;

/// Ids bound per batch-read statement; larger windows are split.
const PEEK_CHUNK_SIZE: usize = 400;

const REQUIRED_TABLES: [&str; 4] = ["users", "commentables", "posts", "comments"];

/// Store over a borrowed, migrated connection.
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStore<'conn> {
    /// Constructs a store from a migrated/ready connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` when the schema is incomplete.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Handle that aborts the statement currently running on this
    /// connection, from any thread.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.conn.get_interrupt_handle()
    }

    fn immediate(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    fn peek<R>(&self, ids: &[Uuid]) -> BoxCollection<'conn, R::Entity>
    where
        R: RawRow + 'static,
    {
        let conn = self.conn;
        let rows = PeekCollection::new(R::ENTITY, ids.to_vec(), move |window: &[Uuid]| {
            fetch_slots::<R>(conn, window)
        });
        Box::new(try_map(rows, R::decode))
    }

    fn scan<R>(&self, filter: Option<Filter>, order: SortOrder) -> BoxCollection<'conn, R::Entity>
    where
        R: RawRow + 'static,
    {
        let conn = self.conn;
        let member_filter = filter.clone();
        let contains = move |id: Uuid| -> RepoResult<bool> {
            Ok(order_key::<R>(conn, member_filter.as_ref(), id)?.is_some())
        };
        let fetch = move |cursor: &Cursor| -> RepoResult<Vec<R>> {
            scan_rows::<R>(conn, filter.as_ref(), order, cursor)
        };
        Box::new(try_map(
            ScanCollection::new(R::ENTITY, contains, fetch),
            R::decode,
        ))
    }

    fn create_comment(&self, parent: Target, new_comment: NewComment) -> RepoResult<Comment> {
        let tx = self.immediate()?;

        let target_id: String = match parent {
            Target::Post(post_id) => {
                let (commentable_id, comments_allowed): (String, i64) = tx
                    .query_row(
                        "SELECT commentable_id, comments_allowed FROM posts WHERE id = ?1;",
                        [post_id.to_string()],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?
                    .ok_or_else(|| RepoError::not_found(EntityKind::Post, post_id))?;
                if !int_to_bool(comments_allowed, "posts.comments_allowed")? {
                    return Err(RepoError::CommentsDisabled(post_id));
                }
                commentable_id
            }
            Target::Comment(comment_id) => tx
                .query_row(
                    "SELECT commentable_id FROM comments WHERE id = ?1;",
                    [comment_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| RepoError::not_found(EntityKind::Comment, comment_id))?,
        };
        if !row_exists(&tx, "users", new_comment.author_id)? {
            return Err(RepoError::not_found(
                EntityKind::User,
                new_comment.author_id,
            ));
        }

        let comment_id = allocate_id(|candidate| row_exists(&tx, "comments", candidate))?;
        let commentable_id = insert_commentable(&tx, TargetKind::Comment)?;
        let comment =
            new_comment.into_comment(comment_id, parse_uuid(&target_id, "comments.target_id")?);

        tx.execute(
            "INSERT INTO comments (
                id,
                author_id,
                commentable_id,
                target_id,
                content,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                comment.id.to_string(),
                comment.author_id.to_string(),
                commentable_id.to_string(),
                target_id,
                comment.content,
                comment.created_at,
            ],
        )?;
        tx.commit()?;
        Ok(comment)
    }

    fn thread(
        &self,
        table: &'static str,
        entity: EntityKind,
        parent_id: Uuid,
        order: SortOrder,
    ) -> RepoResult<BoxCollection<'conn, Comment>> {
        let target_id: String = self
            .conn
            .query_row(
                &format!("SELECT commentable_id FROM {table} WHERE id = ?1;"),
                [parent_id.to_string()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| RepoError::not_found(entity, parent_id))?;

        Ok(self.scan::<CommentRow>(
            Some(Filter {
                column: "target_id",
                value: target_id,
            }),
            order,
        ))
    }
}

impl UserRepository for SqliteStore<'_> {
    fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let tx = self.immediate()?;
        let id = allocate_id(|candidate| row_exists(&tx, "users", candidate))?;
        let user = user.into_user(id);
        tx.execute(
            "INSERT INTO users (id, email, password) VALUES (?1, ?2, ?3);",
            params![user.id.to_string(), user.email, user.password],
        )?;
        tx.commit()?;
        Ok(user)
    }

    fn get_users_by_id(&self, ids: &[UserId]) -> RepoResult<BoxCollection<'_, User>> {
        Ok(self.peek::<UserRow>(ids))
    }
}

impl PostRepository for SqliteStore<'_> {
    fn create_post(&self, post: NewPost) -> RepoResult<Post> {
        let tx = self.immediate()?;
        if !row_exists(&tx, "users", post.author_id)? {
            return Err(RepoError::not_found(EntityKind::User, post.author_id));
        }

        let post_id = allocate_id(|candidate| row_exists(&tx, "posts", candidate))?;
        let commentable_id = insert_commentable(&tx, TargetKind::Post)?;
        let post = post.into_post(post_id);

        tx.execute(
            "INSERT INTO posts (
                id,
                author_id,
                commentable_id,
                title,
                content,
                comments_allowed,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                post.id.to_string(),
                post.author_id.to_string(),
                commentable_id.to_string(),
                post.title,
                post.content,
                post.comments_allowed,
                post.created_at,
            ],
        )?;
        tx.commit()?;
        Ok(post)
    }

    fn get_posts(&self, order: SortOrder) -> RepoResult<BoxCollection<'_, Post>> {
        Ok(self.scan::<PostRow>(None, order))
    }

    fn get_posts_by_id(&self, ids: &[PostId]) -> RepoResult<BoxCollection<'_, Post>> {
        Ok(self.peek::<PostRow>(ids))
    }

    fn update_post(&self, post: &Post) -> RepoResult<Post> {
        let tx = self.immediate()?;
        let changed = tx.execute(
            "UPDATE posts
             SET
                title = ?2,
                content = ?3,
                comments_allowed = ?4
             WHERE id = ?1;",
            params![
                post.id.to_string(),
                post.title,
                post.content,
                post.comments_allowed,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Post, post.id));
        }

        let stored = tx.query_row(
            &format!("SELECT {} FROM posts WHERE id = ?1;", PostRow::COLUMNS),
            [post.id.to_string()],
            PostRow::read,
        )?;
        tx.commit()?;
        stored.decode()
    }
}

impl CommentRepository for SqliteStore<'_> {
    fn create_post_comment(&self, post_id: PostId, comment: NewComment) -> RepoResult<Comment> {
        self.create_comment(Target::Post(post_id), comment)
    }

    fn create_comment_comment(
        &self,
        comment_id: CommentId,
        comment: NewComment,
    ) -> RepoResult<Comment> {
        self.create_comment(Target::Comment(comment_id), comment)
    }

    fn get_comments_by_id(&self, ids: &[CommentId]) -> RepoResult<BoxCollection<'_, Comment>> {
        Ok(self.peek::<CommentRow>(ids))
    }

    fn get_comments_by_post_id(
        &self,
        post_id: PostId,
        order: SortOrder,
    ) -> RepoResult<BoxCollection<'_, Comment>> {
        self.thread("posts", EntityKind::Post, post_id, order)
    }

    fn get_comments_by_comment_id(
        &self,
        comment_id: CommentId,
        order: SortOrder,
    ) -> RepoResult<BoxCollection<'_, Comment>> {
        self.thread("comments", EntityKind::Comment, comment_id, order)
    }

    fn resolve_target(&self, commentable_id: CommentableId) -> RepoResult<Target> {
        let parts = self
            .conn
            .query_row(
                "SELECT
                    commentables.kind AS kind,
                    posts.id AS post_id,
                    comments.id AS comment_id
                 FROM commentables
                 LEFT JOIN posts ON posts.commentable_id = commentables.id
                 LEFT JOIN comments ON comments.commentable_id = commentables.id
                 WHERE commentables.id = ?1;",
                [commentable_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>("kind")?,
                        row.get::<_, Option<String>>("post_id")?,
                        row.get::<_, Option<String>>("comment_id")?,
                    ))
                },
            )
            .optional()?;
        let Some((kind, post_id, comment_id)) = parts else {
            return Err(RepoError::not_found(
                EntityKind::Commentable,
                commentable_id,
            ));
        };

        let kind = TargetKind::parse(&kind).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid commentable kind `{kind}`"))
        })?;
        let post_id = post_id
            .map(|value| parse_uuid(&value, "posts.id"))
            .transpose()?;
        let comment_id = comment_id
            .map(|value| parse_uuid(&value, "comments.id"))
            .transpose()?;
        let target = Target::from_parts(post_id, comment_id)
            .filter(|target| target.kind() == kind)
            .ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "commentable {commentable_id} does not map to exactly one {}",
                    kind.as_str()
                ))
            })?;
        Ok(target)
    }
}

/// Column-level mirror of one table row, decoded into a domain value on
/// iteration.
trait RawRow: Sized {
    type Entity;
    const ENTITY: EntityKind;
    const TABLE: &'static str;
    /// Select list with every column aliased to its bare name.
    const COLUMNS: &'static str;

    fn read(row: &Row<'_>) -> rusqlite::Result<Self>;
    fn decode(self) -> RepoResult<Self::Entity>;
}

struct UserRow {
    id: String,
    email: String,
    password: String,
}

impl RawRow for UserRow {
    type Entity = User;
    const ENTITY: EntityKind = EntityKind::User;
    const TABLE: &'static str = "users";
    const COLUMNS: &'static str =
        "users.id AS id, users.email AS email, users.password AS password";

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
            password: row.get("password")?,
        })
    }

    fn decode(self) -> RepoResult<User> {
        Ok(User {
            id: parse_uuid(&self.id, "users.id")?,
            email: self.email,
            password: self.password,
        })
    }
}

struct PostRow {
    id: String,
    author_id: String,
    title: String,
    content: String,
    comments_allowed: i64,
    created_at: i64,
}

impl RawRow for PostRow {
    type Entity = Post;
    const ENTITY: EntityKind = EntityKind::Post;
    const TABLE: &'static str = "posts";
    const COLUMNS: &'static str = "posts.id AS id,
        posts.author_id AS author_id,
        posts.title AS title,
        posts.content AS content,
        posts.comments_allowed AS comments_allowed,
        posts.created_at AS created_at";

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            author_id: row.get("author_id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            comments_allowed: row.get("comments_allowed")?,
            created_at: row.get("created_at")?,
        })
    }

    fn decode(self) -> RepoResult<Post> {
        Ok(Post {
            id: parse_uuid(&self.id, "posts.id")?,
            author_id: parse_uuid(&self.author_id, "posts.author_id")?,
            title: self.title,
            content: self.content,
            comments_allowed: int_to_bool(self.comments_allowed, "posts.comments_allowed")?,
            created_at: self.created_at,
        })
    }
}

struct CommentRow {
    id: String,
    author_id: String,
    target_id: String,
    content: String,
    created_at: i64,
}

impl RawRow for CommentRow {
    type Entity = Comment;
    const ENTITY: EntityKind = EntityKind::Comment;
    const TABLE: &'static str = "comments";
    const COLUMNS: &'static str = "comments.id AS id,
        comments.author_id AS author_id,
        comments.target_id AS target_id,
        comments.content AS content,
        comments.created_at AS created_at";

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            author_id: row.get("author_id")?,
            target_id: row.get("target_id")?,
            content: row.get("content")?,
            created_at: row.get("created_at")?,
        })
    }

    fn decode(self) -> RepoResult<Comment> {
        Ok(Comment {
            id: parse_uuid(&self.id, "comments.id")?,
            author_id: parse_uuid(&self.author_id, "comments.author_id")?,
            target_id: parse_uuid(&self.target_id, "comments.target_id")?,
            content: self.content,
            created_at: self.created_at,
        })
    }
}

/// Equality restriction applied to a scanned table.
#[derive(Debug, Clone)]
struct Filter {
    column: &'static str,
    value: String,
}

fn fetch_slots<R: RawRow>(conn: &Connection, ids: &[Uuid]) -> RepoResult<Vec<Option<R>>> {
    let mut slots = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(PEEK_CHUNK_SIZE) {
        let values = vec!["(?, ?)"; chunk.len()].join(", ");
        let sql = format!(
            "WITH requested(ord, id) AS (VALUES {values})
             SELECT {columns}
             FROM requested
             LEFT JOIN {table} ON {table}.id = requested.id
             ORDER BY requested.ord ASC;",
            columns = R::COLUMNS,
            table = R::TABLE,
        );

        let mut bind_values: Vec<Value> = Vec::with_capacity(chunk.len() * 2);
        for (ord, id) in chunk.iter().enumerate() {
            bind_values.push(Value::Integer(ord as i64));
            bind_values.push(Value::Text(id.to_string()));
        }

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        while let Some(row) = rows.next()? {
            let id: Option<String> = row.get("id")?;
            slots.push(match id {
                Some(_) => Some(R::read(row)?),
                None => None,
            });
        }
    }

    debug!(
        "event=collection_get module=repo backend=sqlite kind=peek entity={} requested={} rows={}",
        R::ENTITY.as_str(),
        ids.len(),
        slots.iter().filter(|slot| slot.is_some()).count()
    );
    Ok(slots)
}

fn scan_rows<R: RawRow>(
    conn: &Connection,
    filter: Option<&Filter>,
    order: SortOrder,
    cursor: &Cursor,
) -> RepoResult<Vec<R>> {
    let table = R::TABLE;
    let mut sql = format!("SELECT {} FROM {table} WHERE 1 = 1", R::COLUMNS);
    let mut bind_values: Vec<Value> = Vec::new();

    if let Some(filter) = filter {
        sql.push_str(&format!(" AND {table}.{} = ?", filter.column));
        bind_values.push(Value::Text(filter.value.clone()));
    }

    if let Some(after) = cursor.after {
        let key = order_key::<R>(conn, filter, after)?
            .ok_or_else(|| RepoError::not_found(R::ENTITY, after))?;
        sql.push_str(&format!(
            " AND ({table}.created_at {op} ? OR ({table}.created_at = ? AND {table}.seq > ?))",
            op = order.sql_after()
        ));
        bind_values.push(Value::Integer(key.created_at));
        bind_values.push(Value::Integer(key.created_at));
        bind_values.push(Value::Integer(key.seq));
    }

    sql.push_str(&format!(
        " ORDER BY {table}.created_at {}, {table}.seq ASC",
        order.sql_direction()
    ));
    if let Some(limit) = cursor.limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
    }
    sql.push(';');

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(R::read(row)?);
    }

    debug!(
        "event=collection_get module=repo backend=sqlite kind=scan entity={} rows={}",
        R::ENTITY.as_str(),
        out.len()
    );
    Ok(out)
}

/// Sort key of `id`, restricted to rows matching `filter`.
fn order_key<R: RawRow>(
    conn: &Connection,
    filter: Option<&Filter>,
    id: Uuid,
) -> RepoResult<Option<OrderKey>> {
    let mut sql = format!("SELECT created_at, seq FROM {} WHERE id = ?", R::TABLE);
    let mut bind_values = vec![Value::Text(id.to_string())];
    if let Some(filter) = filter {
        sql.push_str(&format!(" AND {} = ?", filter.column));
        bind_values.push(Value::Text(filter.value.clone()));
    }
    sql.push(';');

    let key = conn
        .query_row(&sql, params_from_iter(bind_values), |row| {
            Ok(OrderKey {
                created_at: row.get("created_at")?,
                seq: row.get("seq")?,
            })
        })
        .optional()?;
    Ok(key)
}

fn row_exists(conn: &Connection, table: &'static str, id: Uuid) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn insert_commentable(conn: &Connection, kind: TargetKind) -> RepoResult<CommentableId> {
    let id = allocate_id(|candidate| row_exists(conn, "commentables", candidate))?;
    conn.execute(
        "INSERT INTO commentables (id, kind) VALUES (?1, ?2);",
        params![id.to_string(), kind.as_str()],
    )?;
    Ok(id)
}

fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn int_to_bool(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean `{other}` in {column}"
        ))),
    }
}

fn ensure_store_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
