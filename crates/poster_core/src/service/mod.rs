//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Apply field validation and comment policy before reaching the store.
//! - Translate store errors into the service taxonomy.

use crate::collection::Collection;
use crate::model::ValidationError;
use crate::repo::error::{EntityKind, RepoError, RepoResult};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod blog_service;

pub use blog_service::{BlogService, CommentForm, PostForm};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Coarse classification of [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    NotFound,
    Empty,
    Incorrect,
    Violation,
    IterEmpty,
    IterMultiple,
    Internal,
}

/// Error returned by service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Referenced entity does not exist.
    NotFound { entity: EntityKind, id: Uuid },
    /// Input failed field validation.
    Validation(ValidationError),
    /// Request breaks a domain rule.
    Violation(&'static str),
    /// A single-item lookup produced nothing.
    IterEmpty,
    /// A single-item lookup produced more than one item.
    IterMultiple,
    /// Store failure.
    Internal(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ServiceErrorKind {
        match self {
            Self::NotFound { .. } => ServiceErrorKind::NotFound,
            Self::Validation(ValidationError::Empty(_)) => ServiceErrorKind::Empty,
            Self::Validation(_) => ServiceErrorKind::Incorrect,
            Self::Violation(_) => ServiceErrorKind::Violation,
            Self::IterEmpty => ServiceErrorKind::IterEmpty,
            Self::IterMultiple => ServiceErrorKind::IterMultiple,
            Self::Internal(_) => ServiceErrorKind::Internal,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "not found: {} {id}", entity.as_str()),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Violation(rule) => write!(f, "rule violation: {rule}"),
            Self::IterEmpty => write!(f, "got no instances from collection"),
            Self::IterMultiple => write!(f, "got unexpected multiple instances from collection"),
            Self::Internal(err) => write!(f, "internal error: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Internal(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::CommentsDisabled(_) => Self::Violation(COMMENTS_NOT_ALLOWED),
            other => Self::Internal(other),
        }
    }
}

pub(crate) const COMMENTS_NOT_ALLOWED: &str = "comments to selected post are not allowed";

/// Realizes a collection that must hold exactly one element.
///
/// # Errors
/// - `IterEmpty` / `IterMultiple` on the wrong cardinality.
/// - The element's own error when it failed to load.
pub fn single<C, T>(collection: &C) -> ServiceResult<T>
where
    C: Collection<Item = RepoResult<T>> + ?Sized,
{
    let mut items = collection.get()?;
    let first = items.next().ok_or(ServiceError::IterEmpty)?;
    if items.next().is_some() {
        return Err(ServiceError::IterMultiple);
    }
    Ok(first?)
}

#[cfg(test)]
mod tests {
    use super::{single, ServiceError, ServiceErrorKind};
    use crate::collection::PeekCollection;
    use crate::model::ValidationError;
    use crate::repo::error::{EntityKind, RepoError};
    use uuid::Uuid;

    fn echo(ids: Vec<Uuid>) -> PeekCollection<Uuid, impl Fn(&[Uuid]) -> Result<Vec<Option<Uuid>>, RepoError>> {
        PeekCollection::new(EntityKind::User, ids, |window: &[Uuid]| {
            Ok(window.iter().map(|id| Some(*id)).collect())
        })
    }

    #[test]
    fn single_checks_cardinality() {
        let id = Uuid::new_v4();
        assert_eq!(single(&echo(vec![id])).unwrap(), id);
        assert!(matches!(single(&echo(vec![])), Err(ServiceError::IterEmpty)));
        assert!(matches!(
            single(&echo(vec![id, id])),
            Err(ServiceError::IterMultiple)
        ));
    }

    #[test]
    fn repo_errors_map_by_kind() {
        let id = Uuid::new_v4();
        assert_eq!(
            ServiceError::from(RepoError::not_found(EntityKind::Post, id)).kind(),
            ServiceErrorKind::NotFound
        );
        assert_eq!(
            ServiceError::from(RepoError::CommentsDisabled(id)).kind(),
            ServiceErrorKind::Violation
        );
        assert_eq!(
            ServiceError::from(RepoError::LockPoisoned("read")).kind(),
            ServiceErrorKind::Internal
        );
        assert_eq!(
            ServiceError::from(ValidationError::Empty("post.title")).kind(),
            ServiceErrorKind::Empty
        );
        assert_eq!(
            ServiceError::from(ValidationError::TooLong {
                field: "post.title",
                limit: 1000
            })
            .kind(),
            ServiceErrorKind::Incorrect
        );
    }
}
