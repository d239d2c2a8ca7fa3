use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    KeyRange, KvPair, Result, StateStoreError,
    store::{KvStream, PutOptions, StateStore, validate_key},
};

/// In-memory world state backed by an ordered map.
///
/// Cloning the store yields another handle to the same data. Scans take a
/// snapshot of the requested range, so writes made while a stream is being
/// consumed are not observed by it.
#[derive(Clone, Default)]
pub struct InMemoryStateStore {
    entries: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl InMemoryStateStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if the store holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Removes every key.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

fn bounds(range: &KeyRange) -> (Bound<String>, Bound<String>) {
    let lower = match range.start {
        Some(ref start) => Bound::Included(start.clone()),
        None => Bound::Unbounded,
    };
    let upper = match range.end {
        Some(ref end) => Bound::Excluded(end.clone()),
        None => Bound::Unbounded,
    };
    (lower, upper)
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>, options: PutOptions) -> Result<()> {
        validate_key(key)?;

        let mut entries = self.entries.write().await;
        let exists = entries.contains_key(key);
        if !options.condition.allows(exists) {
            metrics::counter!("world_state_condition_failures").increment(1);
            tracing::debug!(key, condition = %options.condition, "conditional write rejected");
            return Err(StateStoreError::ConditionFailed {
                key: key.to_string(),
                condition: options.condition,
            });
        }

        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        Ok(entries.remove(key).is_some())
    }

    async fn scan_range(&self, range: KeyRange) -> Result<KvStream> {
        use futures_util::stream;

        // An inverted range would make BTreeMap::range panic.
        if let (Some(start), Some(end)) = (&range.start, &range.end)
            && start >= end
        {
            return Ok(Box::pin(stream::empty()));
        }

        let entries = self.entries.read().await;
        let pairs: Vec<KvPair> = entries
            .range(bounds(&range))
            .map(|(key, value)| KvPair::new(key.clone(), value.clone()))
            .collect();

        Ok(Box::pin(stream::iter(pairs.into_iter().map(Ok))))
    }
}
