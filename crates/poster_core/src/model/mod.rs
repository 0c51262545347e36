//! Blog domain model: users, posts, comments and comment targets.
//!
//! # Responsibility
//! - Define canonical data structures shared by both storage backends.
//! - Own field-level validation rules used by the service layer.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID that is never reused.
//! - Timestamps are Unix epoch milliseconds.
//! - Nothing is deleted; posts are the only entity mutated after creation.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod comment;
pub mod post;
pub mod target;
pub mod user;

/// Field-level validation failure for creation/update input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty.
    Empty(&'static str),
    /// Text field exceeds its byte limit.
    TooLong { field: &'static str, limit: usize },
    /// Field has an unacceptable format.
    Malformed(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(field) => write!(f, "{field} can't be empty"),
            Self::TooLong { field, limit } => {
                write!(f, "{field} exceeded max length [{limit}]")
            }
            Self::Malformed(field) => write!(f, "{field} is malformed"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn check_text(
    field: &'static str,
    value: &str,
    limit: usize,
) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    if value.len() > limit {
        return Err(ValidationError::TooLong { field, limit });
    }
    Ok(())
}
