//! Error types for the chat system.

use parley_auth::AuthError;
use parley_database::DatabaseError;
use thiserror::Error;

use crate::forms::FormErrors;

/// Result type alias for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Main error type for the chat system
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("access denied: {reason}")]
    AccessDenied { reason: String },

    #[error("validation failed: {0}")]
    Validation(FormErrors),

    #[error("conflict: {reason}")]
    Conflict { reason: String },

    #[error("database error: {0}")]
    Database(DatabaseError),

    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),
}

impl ChatError {
    /// Create a not found error
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create an access denied error
    pub fn access_denied(reason: impl Into<String>) -> Self {
        Self::AccessDenied {
            reason: reason.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict {
            reason: reason.into(),
        }
    }

    /// Single-field validation failure
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FormErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }
}

impl From<DatabaseError> for ChatError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::Duplicate { reason, .. } => Self::Conflict { reason },
            other => Self::Database(other),
        }
    }
}

impl From<sqlx::Error> for ChatError {
    fn from(error: sqlx::Error) -> Self {
        Self::Database(DatabaseError::Query(error))
    }
}

impl From<FormErrors> for ChatError {
    fn from(errors: FormErrors) -> Self {
        Self::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_query_failure_stays_internal() {
        let error = ChatError::from(DatabaseError::Query(sqlx::Error::RowNotFound));
        assert!(matches!(error, ChatError::Database(DatabaseError::Query(_))));
    }

    #[test]
    fn database_duplicate_becomes_conflict() {
        let error = ChatError::from(DatabaseError::Duplicate {
            entity: "profile",
            reason: "profile already exists".to_string(),
        });
        assert!(matches!(error, ChatError::Conflict { ref reason } if reason == "profile already exists"));
    }

    #[test]
    fn invalid_field_collects_message() {
        let ChatError::Validation(errors) = ChatError::invalid_field("text", "This field is required.")
        else {
            panic!("expected validation error");
        };
        assert_eq!(errors.get("text"), Some(&["This field is required.".to_string()][..]));
    }
}
