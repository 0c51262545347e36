//! Process-local store backed by hash maps.
//!
//! # Responsibility
//! - Implement every repository contract without external storage.
//! - Match the SQLite backend on ordering, pagination and failure behavior.
//!
//! # Invariants
//! - One `RwLock` guards all maps; a write holds the exclusive lock from its
//!   existence checks through id allocation to the final insert.
//! - Reads take the shared lock per realization, so a collection observes
//!   whatever is committed when `get()` runs.

use crate::collection::{BoxCollection, Cursor, PeekCollection, ScanCollection};
use crate::model::comment::{Comment, CommentId, NewComment};
use crate::model::post::{NewPost, Post, PostId};
use crate::model::target::{CommentableId, Target};
use crate::model::user::{NewUser, User, UserId};
use crate::repo::error::{EntityKind, RepoError, RepoResult};
use crate::repo::ids::allocate_id;
use crate::repo::{CommentRepository, OrderKey, PostRepository, SortOrder, UserRepository};
use log::debug;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    last_seq: i64,
    users: HashMap<UserId, Record<User>>,
    posts: HashMap<PostId, Record<Post>>,
    comments: HashMap<CommentId, Record<Comment>>,
    targets: HashMap<CommentableId, Target>,
    commentables: HashMap<Target, CommentableId>,
}

#[derive(Debug)]
struct Record<T> {
    seq: i64,
    value: T,
}

impl State {
    fn next_seq(&mut self) -> i64 {
        self.last_seq += 1;
        self.last_seq
    }

    fn link(&mut self, commentable_id: CommentableId, target: Target) {
        self.targets.insert(commentable_id, target);
        self.commentables.insert(target, commentable_id);
    }

    fn commentable_of(&self, target: Target) -> Option<CommentableId> {
        self.commentables.get(&target).copied()
    }
}

type Table<T> = HashMap<Uuid, Record<T>>;

fn users(state: &State) -> &Table<User> {
    &state.users
}

fn posts(state: &State) -> &Table<Post> {
    &state.posts
}

fn comments(state: &State) -> &Table<Comment> {
    &state.comments
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> RepoResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| RepoError::LockPoisoned("write"))
    }

    fn read(&self) -> RepoResult<RwLockReadGuard<'_, State>> {
        read_state(&self.state)
    }

    fn create_comment(&self, parent: Target, new_comment: NewComment) -> RepoResult<Comment> {
        let mut state = self.write()?;

        match parent {
            Target::Post(post_id) => {
                let post = state
                    .posts
                    .get(&post_id)
                    .ok_or_else(|| RepoError::not_found(EntityKind::Post, post_id))?;
                if !post.value.comments_allowed {
                    return Err(RepoError::CommentsDisabled(post_id));
                }
            }
            Target::Comment(comment_id) => {
                if !state.comments.contains_key(&comment_id) {
                    return Err(RepoError::not_found(EntityKind::Comment, comment_id));
                }
            }
        }
        if !state.users.contains_key(&new_comment.author_id) {
            return Err(RepoError::not_found(
                EntityKind::User,
                new_comment.author_id,
            ));
        }

        let target_id = state
            .commentable_of(parent)
            .ok_or_else(|| RepoError::not_found(EntityKind::Commentable, parent.id()))?;
        let comment_id = allocate_id(|candidate| Ok(state.comments.contains_key(&candidate)))?;
        let commentable_id = allocate_id(|candidate| Ok(state.targets.contains_key(&candidate)))?;

        let comment = new_comment.into_comment(comment_id, target_id);
        let seq = state.next_seq();
        state.comments.insert(
            comment_id,
            Record {
                seq,
                value: comment.clone(),
            },
        );
        state.link(commentable_id, Target::Comment(comment_id));
        Ok(comment)
    }

    fn thread(
        &self,
        parent: Target,
        entity: EntityKind,
        order: SortOrder,
    ) -> RepoResult<BoxCollection<'_, Comment>> {
        let target_id = self
            .read()?
            .commentable_of(parent)
            .ok_or_else(|| RepoError::not_found(entity, parent.id()))?;
        Ok(scan(
            &self.state,
            EntityKind::Comment,
            comments,
            move |comment: &Comment| comment.target_id == target_id,
            |comment| comment.created_at,
            order,
        ))
    }
}

fn read_state(state: &RwLock<State>) -> RepoResult<RwLockReadGuard<'_, State>> {
    state.read().map_err(|_| RepoError::LockPoisoned("read"))
}

fn peek<'a, T>(
    state: &'a RwLock<State>,
    entity: EntityKind,
    ids: &[Uuid],
    table: fn(&State) -> &Table<T>,
) -> BoxCollection<'a, T>
where
    T: Clone + 'a,
{
    Box::new(PeekCollection::new(
        entity,
        ids.to_vec(),
        move |window: &[Uuid]| {
            let guard = read_state(state)?;
            let rows = table(&*guard);
            let slots: Vec<Option<T>> = window
                .iter()
                .map(|id| rows.get(id).map(|record| record.value.clone()))
                .collect();
            debug!(
                "event=collection_get module=repo backend=memory kind=peek entity={} requested={}",
                entity.as_str(),
                window.len()
            );
            Ok(slots)
        },
    ))
}

fn scan<'a, T, P>(
    state: &'a RwLock<State>,
    entity: EntityKind,
    table: fn(&State) -> &Table<T>,
    filter: P,
    created_at: fn(&T) -> i64,
    order: SortOrder,
) -> BoxCollection<'a, T>
where
    T: Clone + 'a,
    P: Fn(&T) -> bool + Clone + 'a,
{
    let member = filter.clone();
    let contains = move |id: Uuid| -> RepoResult<bool> {
        let guard = read_state(state)?;
        Ok(table(&*guard)
            .get(&id)
            .is_some_and(|record| member(&record.value)))
    };

    let fetch = move |cursor: &Cursor| -> RepoResult<Vec<T>> {
        let guard = read_state(state)?;
        let mut matching: Vec<(Uuid, &Record<T>)> = table(&*guard)
            .iter()
            .filter(|(_, record)| filter(&record.value))
            .map(|(id, record)| (*id, record))
            .collect();
        matching.sort_by(|(_, left), (_, right)| {
            order.compare(
                OrderKey {
                    created_at: created_at(&left.value),
                    seq: left.seq,
                },
                OrderKey {
                    created_at: created_at(&right.value),
                    seq: right.seq,
                },
            )
        });

        let window = cursor.window(entity, &matching, |(id, _)| *id)?;
        debug!(
            "event=collection_get module=repo backend=memory kind=scan entity={} rows={}",
            entity.as_str(),
            window.len()
        );
        Ok(window
            .iter()
            .map(|(_, record)| record.value.clone())
            .collect())
    };

    Box::new(ScanCollection::new(entity, contains, fetch))
}

impl UserRepository for InMemoryStore {
    fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut state = self.write()?;
        let id = allocate_id(|candidate| Ok(state.users.contains_key(&candidate)))?;
        let user = user.into_user(id);
        let seq = state.next_seq();
        state.users.insert(
            id,
            Record {
                seq,
                value: user.clone(),
            },
        );
        Ok(user)
    }

    fn get_users_by_id(&self, ids: &[UserId]) -> RepoResult<BoxCollection<'_, User>> {
        Ok(peek(&self.state, EntityKind::User, ids, users))
    }
}

impl PostRepository for InMemoryStore {
    fn create_post(&self, post: NewPost) -> RepoResult<Post> {
        let mut state = self.write()?;
        if !state.users.contains_key(&post.author_id) {
            return Err(RepoError::not_found(EntityKind::User, post.author_id));
        }

        let post_id = allocate_id(|candidate| Ok(state.posts.contains_key(&candidate)))?;
        let commentable_id = allocate_id(|candidate| Ok(state.targets.contains_key(&candidate)))?;

        let post = post.into_post(post_id);
        let seq = state.next_seq();
        state.posts.insert(
            post_id,
            Record {
                seq,
                value: post.clone(),
            },
        );
        state.link(commentable_id, Target::Post(post_id));
        Ok(post)
    }

    fn get_posts(&self, order: SortOrder) -> RepoResult<BoxCollection<'_, Post>> {
        Ok(scan(
            &self.state,
            EntityKind::Post,
            posts,
            |_: &Post| true,
            |post| post.created_at,
            order,
        ))
    }

    fn get_posts_by_id(&self, ids: &[PostId]) -> RepoResult<BoxCollection<'_, Post>> {
        Ok(peek(&self.state, EntityKind::Post, ids, posts))
    }

    fn update_post(&self, post: &Post) -> RepoResult<Post> {
        let mut state = self.write()?;
        let record = state
            .posts
            .get_mut(&post.id)
            .ok_or_else(|| RepoError::not_found(EntityKind::Post, post.id))?;
        record.value.title = post.title.clone();
        record.value.content = post.content.clone();
        record.value.comments_allowed = post.comments_allowed;
        Ok(record.value.clone())
    }
}

impl CommentRepository for InMemoryStore {
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
        Ok(peek(&self.state, EntityKind::Comment, ids, comments))
    }

    fn get_comments_by_post_id(
        &self,
        post_id: PostId,
        order: SortOrder,
    ) -> RepoResult<BoxCollection<'_, Comment>> {
        self.thread(Target::Post(post_id), EntityKind::Post, order)
    }

    fn get_comments_by_comment_id(
        &self,
        comment_id: CommentId,
        order: SortOrder,
    ) -> RepoResult<BoxCollection<'_, Comment>> {
        self.thread(Target::Comment(comment_id), EntityKind::Comment, order)
    }

    fn resolve_target(&self, commentable_id: CommentableId) -> RepoResult<Target> {
        self.read()?
            .targets
            .get(&commentable_id)
            .copied()
            .ok_or_else(|| RepoError::not_found(EntityKind::Commentable, commentable_id))
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryStore;
    use crate::collection::Collection;
    use crate::model::post::NewPost;
    use crate::model::user::NewUser;
    use crate::repo::{PostRepository, SortOrder, UserRepository};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn concurrent_writers_get_distinct_ids_and_sequences() {
        let store = Arc::new(InMemoryStore::new());
        let author = store
            .create_user(NewUser::new("writer@example.com", "secret"))
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|index| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .create_post(NewPost {
                            author_id: author.id,
                            title: format!("post {index}"),
                            content: "body".to_string(),
                            comments_allowed: true,
                            created_at: 100,
                        })
                        .unwrap()
                })
            })
            .collect();
        let mut created: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap().id)
            .collect();
        created.sort();
        created.dedup();
        assert_eq!(created.len(), 8);

        let listed = store.get_posts(SortOrder::DateAsc).unwrap();
        assert_eq!(listed.get().unwrap().count(), 8);
    }

    #[test]
    fn realization_sees_writes_made_after_collection_was_built() {
        let store = InMemoryStore::new();
        let author = store
            .create_user(NewUser::new("late@example.com", "secret"))
            .unwrap();
        let listed = store.get_posts(SortOrder::DateDesc).unwrap();
        assert_eq!(listed.get().unwrap().count(), 0);

        store
            .create_post(NewPost {
                author_id: author.id,
                title: "late".to_string(),
                content: "body".to_string(),
                comments_allowed: false,
                created_at: 1,
            })
            .unwrap();
        assert_eq!(listed.get().unwrap().count(), 1);
    }
}
