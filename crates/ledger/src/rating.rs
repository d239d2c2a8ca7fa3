//! The rating record and its world-state encoding.

use common::RatingId;
use serde::{Deserialize, Serialize};

/// A single place rating.
///
/// Stored as a JSON object with the fields `Id`, `Place`, `Grade` and
/// `Comment`. The field names are part of the stored format and must not
/// change, or previously written records stop decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Rating {
    pub id: RatingId,
    pub place: String,
    pub grade: i64,
    pub comment: String,
}

impl Rating {
    pub fn new(
        id: impl Into<RatingId>,
        place: impl Into<String>,
        grade: i64,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            place: place.into(),
            grade,
            comment: comment.into(),
        }
    }

    /// Encodes the rating as the bytes stored under its id.
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Decodes a rating from stored bytes.
    pub fn decode(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}
