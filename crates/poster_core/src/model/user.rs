//! User domain model.

use crate::model::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Stable user identifier.
pub type UserId = Uuid;

/// Registered author of posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    /// Opaque credential blob. Never serialized outward.
    #[serde(skip_serializing, default)]
    pub password: String,
}

/// Creation input for a user. The id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password: String,
}

impl NewUser {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Checks email shape and that a credential is present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.is_empty() {
            return Err(ValidationError::Empty("user.email"));
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(ValidationError::Malformed("user.email"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::Empty("user.password"));
        }
        Ok(())
    }

    pub(crate) fn into_user(self, id: UserId) -> User {
        User {
            id,
            email: self.email,
            password: self.password,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NewUser;
    use crate::model::ValidationError;

    #[test]
    fn validate_rejects_malformed_email() {
        let err = NewUser::new("not-an-email", "secret")
            .validate()
            .expect_err("email without domain must be rejected");
        assert_eq!(err, ValidationError::Malformed("user.email"));
    }

    #[test]
    fn validate_accepts_regular_address() {
        NewUser::new("reader@example.com", "secret")
            .validate()
            .expect("regular address should pass");
    }
}
