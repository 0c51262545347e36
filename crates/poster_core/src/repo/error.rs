//! Repository error taxonomy shared by every storage backend.
//!
//! # Invariants
//! - Raw driver errors never escape unwrapped; they travel inside `Db`.
//! - Callers discriminate by [`ErrorKind`], never by backend-specific values.

use crate::db::DbError;
use crate::model::post::PostId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity family named in a not-found error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Post,
    Comment,
    Commentable,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Post => "post",
            Self::Comment => "comment",
            Self::Commentable => "commentable",
        }
    }
}

/// Coarse classification used by layers above the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Entity absent, cursor outside its universe, or dangling reference.
    NotFound,
    /// Request refused by a store-level rule before any write happened.
    Rejected,
    /// Storage failure or corrupted state.
    Internal,
}

/// Error for store reads and writes.
#[derive(Debug)]
pub enum RepoError {
    /// Requested entity does not exist in the addressed universe.
    NotFound { entity: EntityKind, id: Uuid },
    /// Post does not accept new comments.
    CommentsDisabled(PostId),
    /// Could not find a free id within the retry budget.
    IdAllocation { attempts: usize },
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// In-memory state lock was poisoned by a panicking writer.
    LockPoisoned(&'static str),
    /// Persisted data cannot be converted to a valid domain value.
    InvalidData(String),
}

impl RepoError {
    pub fn not_found(entity: EntityKind, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::CommentsDisabled(_) => ErrorKind::Rejected,
            Self::IdAllocation { .. }
            | Self::Db(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::LockPoisoned(_)
            | Self::InvalidData(_) => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => {
                write!(f, "{} not found: {id}", entity.as_str())
            }
            Self::CommentsDisabled(id) => write!(f, "comments are disabled for post {id}"),
            Self::IdAllocation { attempts } => {
                write!(f, "no free id found after {attempts} attempts")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "store requires table `{table}`")
            }
            Self::LockPoisoned(operation) => {
                write!(f, "store lock poisoned during {operation}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityKind, ErrorKind, RepoError};
    use uuid::Uuid;

    #[test]
    fn kinds_follow_taxonomy() {
        let id = Uuid::new_v4();
        assert_eq!(
            RepoError::not_found(EntityKind::Post, id).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(RepoError::CommentsDisabled(id).kind(), ErrorKind::Rejected);
        assert_eq!(
            RepoError::from(rusqlite::Error::InvalidQuery).kind(),
            ErrorKind::Internal
        );
        assert_eq!(RepoError::LockPoisoned("read").kind(), ErrorKind::Internal);
    }

    #[test]
    fn not_found_message_names_entity_and_id() {
        let id = Uuid::nil();
        let message = RepoError::not_found(EntityKind::Comment, id).to_string();
        assert_eq!(message, format!("comment not found: {id}"));
    }
}
