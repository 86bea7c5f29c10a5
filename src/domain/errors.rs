//! Domain errors for karma-sync.

use thiserror::Error;

use crate::domain::models::AccountId;

/// Store-level errors.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Player not found: {0}")]
    PlayerNotFound(AccountId),

    #[error("Player already exists: {0}")]
    PlayerExists(AccountId),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}
