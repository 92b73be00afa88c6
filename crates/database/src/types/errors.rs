//! Error types for the database layer

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("database migration error: {0}")]
    Migration(String),

    #[error("database query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("duplicate {entity}: {reason}")]
    Duplicate { entity: &'static str, reason: String },
}

impl DatabaseError {
    /// Map a unique constraint violation to `Duplicate`, anything else to `Query`.
    pub fn from_write(error: sqlx::Error, entity: &'static str, reason: &str) -> Self {
        let unique = error
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false);

        if unique {
            Self::Duplicate {
                entity,
                reason: reason.to_string(),
            }
        } else {
            Self::Query(error)
        }
    }
}
