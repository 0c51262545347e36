//! Post domain model.
//!
//! # Invariants
//! - `id`, `author_id` and `created_at` never change after creation.
//! - Each post owns exactly one commentable, assigned by the store.

use crate::model::user::UserId;
use crate::model::{check_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const POST_TITLE_LENGTH_LIMIT: usize = 1000;
pub const POST_CONTENT_LENGTH_LIMIT: usize = 4000;

/// Stable post identifier.
pub type PostId = Uuid;

/// Top-level authored entry that comments can attach to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub title: String,
    pub content: String,
    /// When `false`, new comments under this post are rejected.
    pub comments_allowed: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Post {
    /// Validates the mutable fields before an update.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_post_text(&self.title, &self.content)
    }
}

/// Creation input for a post. The id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub author_id: UserId,
    pub title: String,
    pub content: String,
    pub comments_allowed: bool,
    pub created_at: i64,
}

impl NewPost {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_post_text(&self.title, &self.content)
    }

    pub(crate) fn into_post(self, id: PostId) -> Post {
        Post {
            id,
            author_id: self.author_id,
            title: self.title,
            content: self.content,
            comments_allowed: self.comments_allowed,
            created_at: self.created_at,
        }
    }
}

fn validate_post_text(title: &str, content: &str) -> Result<(), ValidationError> {
    check_text("post.content", content, POST_CONTENT_LENGTH_LIMIT)?;
    check_text("post.title", title, POST_TITLE_LENGTH_LIMIT)?;
    Ok(())
}
