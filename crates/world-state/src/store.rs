use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use futures_util::StreamExt;

use crate::{KeyRange, KvPair, Result, StateStoreError};

/// Precondition attached to a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteCondition {
    /// Write regardless of whether the key exists.
    #[default]
    Any,
    /// Write only if the key is absent (put-if-absent).
    MustNotExist,
    /// Write only if the key is present (overwrite-existing).
    MustExist,
}

impl WriteCondition {
    /// Returns true if a write under this condition may proceed given whether
    /// the key currently exists.
    pub fn allows(&self, exists: bool) -> bool {
        match self {
            WriteCondition::Any => true,
            WriteCondition::MustNotExist => !exists,
            WriteCondition::MustExist => exists,
        }
    }
}

impl std::fmt::Display for WriteCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteCondition::Any => write!(f, "Any"),
            WriteCondition::MustNotExist => write!(f, "MustNotExist"),
            WriteCondition::MustExist => write!(f, "MustExist"),
        }
    }
}

/// Options for writing a value to the store.
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// Presence check evaluated atomically with the write.
    pub condition: WriteCondition,
}

impl PutOptions {
    /// Creates options with no presence check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options that fail with `ConditionFailed` if the key exists.
    pub fn expect_absent() -> Self {
        Self {
            condition: WriteCondition::MustNotExist,
        }
    }

    /// Creates options that fail with `ConditionFailed` if the key is missing.
    pub fn expect_present() -> Self {
        Self {
            condition: WriteCondition::MustExist,
        }
    }
}

/// A stream of key-value pairs in ascending key order.
pub type KvStream = Pin<Box<dyn Stream<Item = Result<KvPair>> + Send>>;

/// Core trait for world state implementations.
///
/// Keys are strings and values are opaque bytes. Scans return keys in
/// ascending order and enumerate every live key in the range exactly once.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// Returns None if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Writes `value` under `key`.
    ///
    /// The presence check in `options.condition` and the write happen as a
    /// single atomic step.
    async fn put(&self, key: &str, value: Vec<u8>, options: PutOptions) -> Result<()>;

    /// Removes `key` from the store.
    ///
    /// Returns true if a value was removed, false if the key was absent.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Streams all pairs whose keys fall inside `range`.
    async fn scan_range(&self, range: KeyRange) -> Result<KvStream>;
}

/// Extension trait providing convenience methods for state stores.
#[async_trait]
pub trait StateStoreExt: StateStore {
    /// Checks if a value is stored under `key`.
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Writes `value` under `key` with no presence check.
    async fn put_unconditional(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.put(key, value, PutOptions::new()).await
    }

    /// Streams the entire key space.
    async fn scan_all(&self) -> Result<KvStream> {
        self.scan_range(KeyRange::all()).await
    }

    /// Collects a range scan into memory.
    async fn collect_range(&self, range: KeyRange) -> Result<Vec<KvPair>> {
        let mut stream = self.scan_range(range).await?;
        let mut pairs = Vec::new();
        while let Some(pair) = stream.next().await {
            pairs.push(pair?);
        }
        Ok(pairs)
    }
}

// Blanket implementation for all StateStore implementations
impl<T: StateStore + ?Sized> StateStoreExt for T {}

/// Rejects keys that no implementation can store.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StateStoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
