//! Notifications emitted after successful mutations.
//!
//! Delivery is fire-and-forget over a broadcast channel: a notification
//! with no subscribers is dropped, and a slow subscriber only lags itself.

use chrono::{DateTime, Utc};
use common::RatingId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 256;

/// The mutation a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerEventKind {
    RatingCreated,
    RatingUpdated,
    RatingDeleted,
}

impl LedgerEventKind {
    /// Event name as published to subscribers.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEventKind::RatingCreated => "CreateRatingEvent",
            LedgerEventKind::RatingUpdated => "UpdateRatingEvent",
            LedgerEventKind::RatingDeleted => "DeleteRatingEvent",
        }
    }
}

impl std::fmt::Display for LedgerEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A notification about a committed mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub event_id: Uuid,
    pub kind: LedgerEventKind,
    pub rating_id: RatingId,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl LedgerEvent {
    pub fn new(kind: LedgerEventKind, rating_id: RatingId) -> Self {
        let verb = match kind {
            LedgerEventKind::RatingCreated => "created",
            LedgerEventKind::RatingUpdated => "updated",
            LedgerEventKind::RatingDeleted => "deleted",
        };
        Self {
            event_id: Uuid::new_v4(),
            kind,
            message: format!("Rating {rating_id} {verb} successfully"),
            rating_id,
            timestamp: Utc::now(),
        }
    }
}

/// Sending half of the notification channel.
#[derive(Debug, Clone)]
pub(crate) struct EventPublisher {
    sender: broadcast::Sender<LedgerEvent>,
}

impl EventPublisher {
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn publish(&self, kind: LedgerEventKind, rating_id: RatingId) {
        let event = LedgerEvent::new(kind, rating_id);
        tracing::debug!(event = %event.kind, rating_id = %event.rating_id, "publishing notification");
        // Err only means nobody is subscribed.
        let _ = self.sender.send(event);
    }
}
