use thiserror::Error;

use crate::WriteCondition;

/// Errors that can occur when interacting with the world state.
#[derive(Debug, Error)]
pub enum StateStoreError {
    /// A conditional write was rejected because the key's presence did not
    /// match the requested condition.
    #[error("Write condition {condition} failed for key {key}")]
    ConditionFailed {
        key: String,
        condition: WriteCondition,
    },

    /// The key cannot be stored (for example, it is empty).
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for world state operations.
pub type Result<T> = std::result::Result<T, StateStoreError>;
