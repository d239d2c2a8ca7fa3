//! The rating ledger engine.

use common::RatingId;
use futures_util::StreamExt;
use tokio::sync::broadcast;
use world_state::{PutOptions, StateStore, StateStoreError, StateStoreExt};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::events::{EventPublisher, LedgerEvent, LedgerEventKind};
use crate::rating::Rating;
use crate::report::{PlaceStats, PlaceSummary, RatingReport};

/// CRUD over ratings and read-only aggregates, expressed purely in terms of
/// a [`StateStore`].
///
/// The ledger holds no rating data of its own; every call reads the store.
/// Rating ids are supplied by the caller and keeping them unique is the
/// caller's job. Creates, updates and deletes probe for the id first and
/// then write with a matching [`PutOptions`] condition, so a conflicting
/// write that slips in between surfaces as `AlreadyExists` or `NotFound`.
pub struct RatingLedger<S: StateStore> {
    store: S,
    config: LedgerConfig,
    events: EventPublisher,
}

impl<S: StateStore> RatingLedger<S> {
    /// Creates a ledger over `store` with the default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, LedgerConfig::default())
    }

    pub fn with_config(store: S, config: LedgerConfig) -> Self {
        Self {
            store,
            config,
            events: EventPublisher::new(),
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Subscribes to mutation notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    /// Writes the configured seed ratings whose ids are not yet stored.
    ///
    /// Safe to call repeatedly and on a store that already holds data;
    /// existing records are never overwritten.
    #[tracing::instrument(skip(self))]
    pub async fn initialize(&self) -> Result<()> {
        let mut seeded = 0usize;
        for rating in &self.config.seed {
            match self
                .store
                .put(rating.id.as_str(), rating.encode()?, PutOptions::expect_absent())
                .await
            {
                Ok(()) => seeded += 1,
                Err(StateStoreError::ConditionFailed { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!(seeded, "ledger initialized");
        Ok(())
    }

    /// Stores a new rating under `id`.
    ///
    /// Fails with `AlreadyExists` if the id is taken and with
    /// `InvalidGrade` if the grade violates the configured policy.
    #[tracing::instrument(skip(self, comment))]
    pub async fn create_rating(
        &self,
        id: &str,
        place: &str,
        grade: i64,
        comment: &str,
    ) -> Result<Rating> {
        self.check_grade("create_rating", grade)?;

        if self.store.exists(id).await? {
            return Err(record_failure(
                "create_rating",
                LedgerError::AlreadyExists(RatingId::new(id)),
            ));
        }

        let rating = Rating::new(id, place, grade, comment);
        self.store
            .put(id, rating.encode()?, PutOptions::expect_absent())
            .await
            .map_err(|e| match e {
                StateStoreError::ConditionFailed { .. } => {
                    record_failure("create_rating", LedgerError::AlreadyExists(rating.id.clone()))
                }
                other => other.into(),
            })?;

        metrics::counter!("ledger_ratings_created").increment(1);
        tracing::info!(id, place, grade, "rating created");
        self.events
            .publish(LedgerEventKind::RatingCreated, rating.id.clone());

        Ok(rating)
    }

    /// Reads the rating stored under `id`.
    #[tracing::instrument(skip(self))]
    pub async fn read_rating(&self, id: &str) -> Result<Rating> {
        let bytes = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| record_failure("read_rating", LedgerError::rating_not_found(id)))?;

        decode(id, &bytes)
    }

    /// Replaces every field of the rating stored under `id` except the id.
    #[tracing::instrument(skip(self, comment))]
    pub async fn update_rating(
        &self,
        id: &str,
        place: &str,
        grade: i64,
        comment: &str,
    ) -> Result<Rating> {
        self.check_grade("update_rating", grade)?;

        if !self.store.exists(id).await? {
            return Err(record_failure(
                "update_rating",
                LedgerError::rating_not_found(id),
            ));
        }

        let rating = Rating::new(id, place, grade, comment);
        self.store
            .put(id, rating.encode()?, PutOptions::expect_present())
            .await
            .map_err(|e| match e {
                StateStoreError::ConditionFailed { .. } => {
                    record_failure("update_rating", LedgerError::rating_not_found(id))
                }
                other => other.into(),
            })?;

        metrics::counter!("ledger_ratings_updated").increment(1);
        tracing::info!(id, place, grade, "rating updated");
        self.events
            .publish(LedgerEventKind::RatingUpdated, rating.id.clone());

        Ok(rating)
    }

    /// Removes the rating stored under `id`.
    #[tracing::instrument(skip(self))]
    pub async fn delete_rating(&self, id: &str) -> Result<()> {
        if !self.store.exists(id).await? || !self.store.delete(id).await? {
            return Err(record_failure(
                "delete_rating",
                LedgerError::rating_not_found(id),
            ));
        }

        metrics::counter!("ledger_ratings_deleted").increment(1);
        tracing::info!(id, "rating deleted");
        self.events
            .publish(LedgerEventKind::RatingDeleted, RatingId::new(id));

        Ok(())
    }

    /// Returns true if a rating is stored under `id`.
    #[tracing::instrument(skip(self))]
    pub async fn rating_exists(&self, id: &str) -> Result<bool> {
        Ok(self.store.exists(id).await?)
    }

    /// Returns every rating in store scan order.
    ///
    /// A single undecodable record fails the whole call.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_ratings(&self) -> Result<Vec<Rating>> {
        self.scan_ratings().await
    }

    /// Returns the ratings whose place equals `place` exactly.
    ///
    /// An empty result is reported as `NotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn get_ratings_for_place(&self, place: &str) -> Result<Vec<Rating>> {
        let ratings: Vec<Rating> = self
            .scan_ratings()
            .await?
            .into_iter()
            .filter(|r| r.place == place)
            .collect();

        if ratings.is_empty() {
            return Err(record_failure(
                "get_ratings_for_place",
                LedgerError::place_not_found(place),
            ));
        }

        Ok(ratings)
    }

    /// Returns the mean grade of the ratings for `place`.
    ///
    /// A place with no ratings is reported as `NotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn calculate_average_grade_for_place(&self, place: &str) -> Result<f64> {
        let mut stats = PlaceStats::default();
        for rating in self.scan_ratings().await? {
            if rating.place == place {
                stats.add(rating.grade);
            }
        }

        stats.average().ok_or_else(|| {
            record_failure(
                "calculate_average_grade_for_place",
                LedgerError::place_not_found(place),
            )
        })
    }

    /// Returns the ratings for `place` together with their average.
    #[tracing::instrument(skip(self))]
    pub async fn place_summary(&self, place: &str) -> Result<PlaceSummary> {
        let ratings = self.get_ratings_for_place(place).await?;

        let mut stats = PlaceStats::default();
        for rating in &ratings {
            stats.add(rating.grade);
        }

        Ok(PlaceSummary {
            place: place.to_string(),
            average: stats.average().unwrap_or_default(),
            ratings,
        })
    }

    /// Returns true if the store holds no keys at all.
    ///
    /// Stored values are not decoded.
    #[tracing::instrument(skip(self))]
    pub async fn are_ratings_empty(&self) -> Result<bool> {
        let mut stream = self.store.scan_all().await?;
        match stream.next().await {
            None => Ok(true),
            Some(pair) => {
                pair?;
                Ok(false)
            }
        }
    }

    /// Ranks every place by descending average grade.
    #[tracing::instrument(skip(self))]
    pub async fn ranking(&self) -> Result<RatingReport> {
        let ratings = self.scan_ratings().await?;
        Ok(RatingReport::from_ratings(&ratings))
    }

    /// Renders the ranking as a table: a fixed header, then one
    /// `average\t\tplace` line per place. Header only when the ledger is
    /// empty.
    #[tracing::instrument(skip(self))]
    pub async fn get_rating(&self) -> Result<String> {
        Ok(self.ranking().await?.to_string())
    }

    fn check_grade(&self, operation: &'static str, grade: i64) -> Result<()> {
        self.config
            .grade_policy
            .check(grade)
            .map_err(|e| record_failure(operation, e))
    }

    /// Scans the entire key space and decodes every value.
    async fn scan_ratings(&self) -> Result<Vec<Rating>> {
        let mut stream = self.store.scan_all().await?;
        let mut ratings = Vec::new();

        while let Some(pair) = stream.next().await {
            let pair = pair?;
            ratings.push(decode(&pair.key, &pair.value)?);
        }

        metrics::counter!("ledger_scans").increment(1);
        metrics::histogram!("ledger_scan_records").record(ratings.len() as f64);
        tracing::debug!(records = ratings.len(), "world state scanned");

        Ok(ratings)
    }
}

fn decode(key: &str, bytes: &[u8]) -> Result<Rating> {
    Rating::decode(bytes).map_err(|source| {
        tracing::error!(key, error = %source, "stored rating failed to decode");
        record_failure(
            "decode",
            LedgerError::Deserialization {
                key: key.to_string(),
                source,
            },
        )
    })
}

fn record_failure(operation: &'static str, err: LedgerError) -> LedgerError {
    metrics::counter!("ledger_operation_errors", "operation" => operation, "kind" => err.kind())
        .increment(1);
    tracing::debug!(operation, error = %err, "ledger operation rejected");
    err
}
