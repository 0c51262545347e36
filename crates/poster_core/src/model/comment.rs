//! Comment domain model.
//!
//! # Invariants
//! - `target_id` is always a commentable id, never a raw post/comment id.
//! - Comments are append-only.

use crate::model::target::CommentableId;
use crate::model::user::UserId;
use crate::model::{check_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const COMMENT_CONTENT_LENGTH_LIMIT: usize = 2000;

/// Stable comment identifier.
pub type CommentId = Uuid;

/// Reply attached to a post or to another comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub author_id: UserId,
    /// Commentable this comment replies to.
    pub target_id: CommentableId,
    pub content: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Creation input for a comment. Parent and id are supplied by the store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub author_id: UserId,
    pub content: String,
    pub created_at: i64,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_text("comment.content", &self.content, COMMENT_CONTENT_LENGTH_LIMIT)
    }

    pub(crate) fn into_comment(self, id: CommentId, target_id: CommentableId) -> Comment {
        Comment {
            id,
            author_id: self.author_id,
            target_id,
            content: self.content,
            created_at: self.created_at,
        }
    }
}
