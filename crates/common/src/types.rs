use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Identifier of a rating, used verbatim as its world-state key.
///
/// Ids are assigned by the caller. The ledger only checks whether a key is
/// already present; it never derives or normalizes ids itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingId(String);

impl RatingId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a timestamp-based identifier of the form `rating<nanos>`.
    ///
    /// Two calls within the same nanosecond produce the same id; callers
    /// that need stronger guarantees should supply their own ids.
    pub fn generate() -> Self {
        let now = Utc::now();
        let nanos = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_millis().saturating_mul(1_000_000));
        Self(format!("rating{nanos}"))
    }

    /// Returns the identifier as a string slice (the store key).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id and returns the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for RatingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RatingId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RatingId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<RatingId> for String {
    fn from(id: RatingId) -> Self {
        id.0
    }
}

impl AsRef<str> for RatingId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
