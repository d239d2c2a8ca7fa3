//! Ordered key-value world state.
//!
//! The ledger reads and writes raw bytes through the [`StateStore`] trait.
//! Two implementations are provided: [`InMemoryStateStore`] backed by an
//! ordered map, and [`PostgresStateStore`] backed by a single table.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod range;
pub mod store;

pub use error::{Result, StateStoreError};
pub use memory::InMemoryStateStore;
pub use postgres::PostgresStateStore;
pub use range::{KeyRange, KvPair};
pub use store::{KvStream, PutOptions, StateStore, StateStoreExt, WriteCondition};
