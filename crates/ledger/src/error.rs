//! Ledger error types.

use common::RatingId;
use thiserror::Error;
use world_state::StateStoreError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A rating with this id is already stored.
    #[error("the rating {0} already exists")]
    AlreadyExists(RatingId),

    /// No rating matched the requested id or place.
    #[error("{0}")]
    NotFound(String),

    /// The bytes stored under a key do not decode into a rating.
    #[error("failed to decode rating stored under {key}: {source}")]
    Deserialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A rating could not be encoded for storage.
    #[error("failed to encode rating: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The grade lies outside the configured policy.
    #[error("grade {grade} is outside the allowed range {min}..={max}")]
    InvalidGrade { grade: i64, min: i64, max: i64 },

    /// The world state itself failed.
    #[error("world state error: {0}")]
    Store(#[from] StateStoreError),
}

impl LedgerError {
    pub fn rating_not_found(id: &str) -> Self {
        LedgerError::NotFound(format!("the rating {id} does not exist"))
    }

    pub fn place_not_found(place: &str) -> Self {
        LedgerError::NotFound(format!("no ratings found for place {place}"))
    }

    /// Short machine-readable name used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::AlreadyExists(_) => "already_exists",
            LedgerError::NotFound(_) => "not_found",
            LedgerError::Deserialization { .. } => "deserialization",
            LedgerError::Serialization(_) => "serialization",
            LedgerError::InvalidGrade { .. } => "invalid_grade",
            LedgerError::Store(_) => "store",
        }
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
