//! Place rating ledger.
//!
//! This crate provides the rating ledger engine:
//! - `Rating` records and their JSON world-state encoding
//! - `RatingLedger` with CRUD over ratings and read-only aggregate reports
//! - `RatingReport` ranking of places by average grade
//! - Grade policy configuration and the mutation notification channel

pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod rating;
pub mod report;

pub use config::{GradePolicy, LedgerConfig};
pub use error::{LedgerError, Result};
pub use events::{LedgerEvent, LedgerEventKind};
pub use ledger::RatingLedger;
pub use rating::Rating;
pub use report::{PlaceAverage, PlaceStats, PlaceSummary, REPORT_HEADER, RatingReport};

pub use common::RatingId;
