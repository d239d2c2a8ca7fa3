use serde::{Deserialize, Serialize};

/// A key and its raw value as returned by a range scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvPair {
    pub key: String,
    pub value: Vec<u8>,
}

impl KvPair {
    pub fn new(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Half-open key range used for scans.
///
/// `start` is inclusive and `end` is exclusive. A missing or empty bound
/// leaves that side of the range open, so `KeyRange::all()` enumerates the
/// whole key space.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl KeyRange {
    /// The entire key space.
    pub fn all() -> Self {
        Self::default()
    }

    /// Builds a range from raw bounds, treating empty strings as unbounded.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        let start = start.into();
        let end = end.into();
        Self {
            start: (!start.is_empty()).then_some(start),
            end: (!end.is_empty()).then_some(end),
        }
    }

    /// Every key greater than or equal to `start`.
    pub fn starting_at(start: impl Into<String>) -> Self {
        Self::new(start, "")
    }

    /// Every key strictly below `end`.
    pub fn before(end: impl Into<String>) -> Self {
        Self::new("", end)
    }

    /// Returns true when both bounds are open.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Returns true if `key` falls inside the range.
    pub fn contains(&self, key: &str) -> bool {
        if let Some(ref start) = self.start
            && key < start.as_str()
        {
            return false;
        }
        if let Some(ref end) = self.end
            && key >= end.as_str()
        {
            return false;
        }
        true
    }
}
