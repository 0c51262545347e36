//! Repository contracts and storage backends.
//!
//! # Responsibility
//! - Define the user/post/comment data access contracts.
//! - Provide two interchangeable backends with identical observable
//!   behavior: [`InMemoryStore`] and [`SqliteStore`].
//!
//! # Invariants
//! - Every write that touches more than one record is all-or-nothing.
//! - Batch reads are positional: one element per requested id, a missing id
//!   yields a NotFound element rather than shrinking the result.
//! - Listings follow a total order: `created_at` in the requested direction,
//!   then insertion order.

use crate::collection::BoxCollection;
use crate::model::comment::{Comment, CommentId, NewComment};
use crate::model::post::{NewPost, Post, PostId};
use crate::model::target::{CommentableId, Target};
use crate::model::user::{NewUser, User, UserId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub mod error;
mod ids;
pub mod memory_store;
pub mod sqlite_store;

pub use error::{EntityKind, ErrorKind, RepoError, RepoResult};
pub use memory_store::InMemoryStore;
pub use sqlite_store::SqliteStore;

/// Listing direction over `created_at`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Oldest first.
    DateAsc,
    /// Newest first.
    #[default]
    DateDesc,
}

impl SortOrder {
    /// Compares two records under this order; ties fall back to insertion
    /// order in both directions.
    pub fn compare(self, left: OrderKey, right: OrderKey) -> Ordering {
        let by_date = match self {
            Self::DateAsc => left.created_at.cmp(&right.created_at),
            Self::DateDesc => right.created_at.cmp(&left.created_at),
        };
        by_date.then(left.seq.cmp(&right.seq))
    }

    pub(crate) fn sql_direction(self) -> &'static str {
        match self {
            Self::DateAsc => "ASC",
            Self::DateDesc => "DESC",
        }
    }

    /// Comparison that selects rows strictly later in this order.
    pub(crate) fn sql_after(self) -> &'static str {
        match self {
            Self::DateAsc => ">",
            Self::DateDesc => "<",
        }
    }
}

/// Sort key of one stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderKey {
    pub created_at: i64,
    /// Store-assigned insertion sequence.
    pub seq: i64,
}

/// User persistence contract.
pub trait UserRepository {
    /// Stores a new user under a freshly allocated id.
    fn create_user(&self, user: NewUser) -> RepoResult<User>;
    /// Positional batch lookup.
    fn get_users_by_id(&self, ids: &[UserId]) -> RepoResult<BoxCollection<'_, User>>;
}

/// Post persistence contract.
pub trait PostRepository {
    /// Stores a post together with its commentable node.
    ///
    /// # Errors
    /// - NotFound when the author does not exist.
    fn create_post(&self, post: NewPost) -> RepoResult<Post>;
    /// Every post under `order`.
    fn get_posts(&self, order: SortOrder) -> RepoResult<BoxCollection<'_, Post>>;
    /// Positional batch lookup.
    fn get_posts_by_id(&self, ids: &[PostId]) -> RepoResult<BoxCollection<'_, Post>>;
    /// Replaces title, content and the comments flag; returns the stored post.
    fn update_post(&self, post: &Post) -> RepoResult<Post>;
}

/// Comment persistence contract.
pub trait CommentRepository {
    /// # Errors
    /// - NotFound for a missing post or author.
    /// - `CommentsDisabled` when the post does not accept comments; nothing
    ///   is written in that case.
    fn create_post_comment(&self, post_id: PostId, comment: NewComment) -> RepoResult<Comment>;
    fn create_comment_comment(
        &self,
        comment_id: CommentId,
        comment: NewComment,
    ) -> RepoResult<Comment>;
    fn get_comments_by_id(&self, ids: &[CommentId]) -> RepoResult<BoxCollection<'_, Comment>>;
    /// Direct replies to a post. NotFound when the post does not exist.
    fn get_comments_by_post_id(
        &self,
        post_id: PostId,
        order: SortOrder,
    ) -> RepoResult<BoxCollection<'_, Comment>>;
    /// Direct replies to a comment. NotFound when the comment does not exist.
    fn get_comments_by_comment_id(
        &self,
        comment_id: CommentId,
        order: SortOrder,
    ) -> RepoResult<BoxCollection<'_, Comment>>;
    /// Maps a commentable id back to the post or comment that owns it.
    fn resolve_target(&self, commentable_id: CommentableId) -> RepoResult<Target>;
}

/// Full store: the union of all repository contracts.
pub trait Store: UserRepository + PostRepository + CommentRepository {}

impl<T> Store for T where T: UserRepository + PostRepository + CommentRepository {}

#[cfg(test)]
mod tests {
    use super::{OrderKey, SortOrder};
    use std::cmp::Ordering;

    #[test]
    fn equal_dates_fall_back_to_insertion_order_in_both_directions() {
        let first = OrderKey {
            created_at: 10,
            seq: 1,
        };
        let second = OrderKey {
            created_at: 10,
            seq: 2,
        };
        assert_eq!(SortOrder::DateAsc.compare(first, second), Ordering::Less);
        assert_eq!(SortOrder::DateDesc.compare(first, second), Ordering::Less);
    }

    #[test]
    fn direction_flips_date_comparison() {
        let old = OrderKey {
            created_at: 1,
            seq: 2,
        };
        let new = OrderKey {
            created_at: 2,
            seq: 1,
        };
        assert_eq!(SortOrder::DateAsc.compare(old, new), Ordering::Less);
        assert_eq!(SortOrder::DateDesc.compare(old, new), Ordering::Greater);
        assert_eq!(SortOrder::default(), SortOrder::DateDesc);
    }
}
