//! Commentable indirection: "something a comment can attach to".
//!
//! # Responsibility
//! - Model post-or-comment attachment as a tagged sum type.
//! - Give post threads and comment threads one shared lookup key.
//!
//! # Invariants
//! - A commentable maps to exactly one post or exactly one comment.
//! - `Target::from_parts` refuses both-populated and none-populated inputs.

use crate::model::comment::CommentId;
use crate::model::post::PostId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable commentable identifier.
pub type CommentableId = Uuid;

/// Parent entity that owns a commentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Target {
    Post(PostId),
    Comment(CommentId),
}

/// Discriminant of [`Target`], persisted as `commentables.kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Post,
    Comment,
}

impl Target {
    /// Builds a target from two optional parent columns.
    ///
    /// Returns `None` unless exactly one side is populated.
    pub fn from_parts(post: Option<PostId>, comment: Option<CommentId>) -> Option<Self> {
        match (post, comment) {
            (Some(post_id), None) => Some(Self::Post(post_id)),
            (None, Some(comment_id)) => Some(Self::Comment(comment_id)),
            _ => None,
        }
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            Self::Post(_) => TargetKind::Post,
            Self::Comment(_) => TargetKind::Comment,
        }
    }

    /// Domain id of the parent entity.
    pub fn id(&self) -> Uuid {
        match self {
            Self::Post(id) | Self::Comment(id) => *id,
        }
    }
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "post" => Some(Self::Post),
            "comment" => Some(Self::Comment),
            _ => None,
        }
    }
}
