//! Integration tests for the rating ledger.

use async_trait::async_trait;
use ledger::{GradePolicy, LedgerConfig, LedgerError, LedgerEventKind, Rating, RatingLedger};
use world_state::{
    InMemoryStateStore, KeyRange, KvStream, PutOptions, StateStore, StateStoreError,
    StateStoreExt,
};

struct TestHarness {
    ledger: RatingLedger<InMemoryStateStore>,
    store: InMemoryStateStore,
}

impl TestHarness {
    fn new() -> Self {
        let store = InMemoryStateStore::new();
        let ledger = RatingLedger::new(store.clone());
        Self { ledger, store }
    }

    async fn seed(&self, ratings: &[(&str, &str, i64)]) {
        for (id, place, grade) in ratings {
            self.ledger
                .create_rating(id, place, *grade, "")
                .await
                .unwrap();
        }
    }
}

/// A store whose every call fails, to check pass-through of store errors.
struct UnavailableStore;

#[async_trait]
impl StateStore for UnavailableStore {
    async fn get(&self, _key: &str) -> world_state::Result<Option<Vec<u8>>> {
        Err(StateStoreError::Database(sqlx_unavailable()))
    }

    async fn put(&self, _key: &str, _value: Vec<u8>, _options: PutOptions) -> world_state::Result<()> {
        Err(StateStoreError::Database(sqlx_unavailable()))
    }

    async fn delete(&self, _key: &str) -> world_state::Result<bool> {
        Err(StateStoreError::Database(sqlx_unavailable()))
    }

    async fn scan_range(&self, _range: KeyRange) -> world_state::Result<KvStream> {
        Err(StateStoreError::Database(sqlx_unavailable()))
    }
}

fn sqlx_unavailable() -> sqlx::Error {
    sqlx::Error::PoolTimedOut
}

/// A store that lets a competing writer act between the ledger's existence
/// probe and its write.
#[derive(Clone, Default)]
struct RacingStore {
    inner: InMemoryStateStore,
}

#[async_trait]
impl StateStore for RacingStore {
    async fn get(&self, key: &str) -> world_state::Result<Option<Vec<u8>>> {
        let value = self.inner.get(key).await?;
        // Flip the key's presence right after it is observed.
        if value.is_some() {
            self.inner.delete(key).await?;
        } else {
            let rival = Rating::new(key, "rival", 1, "").encode().unwrap();
            self.inner.put_unconditional(key, rival).await?;
        }
        Ok(value)
    }

    async fn put(&self, key: &str, value: Vec<u8>, options: PutOptions) -> world_state::Result<()> {
        self.inner.put(key, value, options).await
    }

    async fn delete(&self, key: &str) -> world_state::Result<bool> {
        self.inner.delete(key).await
    }

    async fn scan_range(&self, range: KeyRange) -> world_state::Result<KvStream> {
        self.inner.scan_range(range).await
    }
}

#[tokio::test]
async fn full_rating_lifecycle() {
    let h = TestHarness::new();

    assert!(!h.ledger.rating_exists("rating1").await.unwrap());
    h.ledger
        .create_rating("rating1", "Lisbon", 4, "pastel de nata")
        .await
        .unwrap();
    assert!(h.ledger.rating_exists("rating1").await.unwrap());

    h.ledger
        .update_rating("rating1", "Porto", 5, "francesinha")
        .await
        .unwrap();
    assert_eq!(
        h.ledger.read_rating("rating1").await.unwrap(),
        Rating::new("rating1", "Porto", 5, "francesinha")
    );

    h.ledger.delete_rating("rating1").await.unwrap();
    assert!(!h.ledger.rating_exists("rating1").await.unwrap());
    assert!(h.ledger.are_ratings_empty().await.unwrap());
}

#[tokio::test]
async fn key_space_equals_live_rating_ids() {
    let h = TestHarness::new();
    h.seed(&[("c", "X", 1), ("a", "X", 2), ("b", "Y", 3)]).await;
    h.ledger.delete_rating("b").await.unwrap();

    let keys: Vec<String> = h
        .store
        .collect_range(KeyRange::all())
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.key)
        .collect();
    assert_eq!(keys, vec!["a", "c"]);

    let ids: Vec<String> = h
        .ledger
        .get_all_ratings()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id.into_inner())
        .collect();
    assert_eq!(ids, keys);
}

#[tokio::test]
async fn aggregation_example() {
    let h = TestHarness::new();
    h.seed(&[("1", "A", 4), ("2", "A", 2), ("3", "B", 5)]).await;

    assert_eq!(
        h.ledger.calculate_average_grade_for_place("A").await.unwrap(),
        3.0
    );
    assert_eq!(
        h.ledger.calculate_average_grade_for_place("B").await.unwrap(),
        5.0
    );
    assert!(matches!(
        h.ledger.calculate_average_grade_for_place("C").await,
        Err(LedgerError::NotFound(_))
    ));
}

#[tokio::test]
async fn report_orders_by_average_with_ties() {
    let h = TestHarness::new();
    // A: 4.5, B: 3.0, C: 4.5
    h.seed(&[
        ("1", "A", 4),
        ("2", "A", 5),
        ("3", "B", 3),
        ("4", "C", 5),
        ("5", "C", 4),
    ])
    .await;

    let report = h.ledger.get_rating().await.unwrap();
    let lines: Vec<&str> = report.lines().collect();

    assert_eq!(lines[0], "Average Grade\t\tPlace");
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[3], "3.00\t\tB");

    let mut tied = vec![lines[1], lines[2]];
    tied.sort();
    assert_eq!(tied, vec!["4.50\t\tA", "4.50\t\tC"]);
    assert!(report.ends_with('\n'));
}

#[tokio::test]
async fn structured_ranking_matches_report() {
    let h = TestHarness::new();
    h.seed(&[("1", "A", 4), ("2", "A", 2), ("3", "B", 5)]).await;

    let ranking = h.ledger.ranking().await.unwrap();
    assert_eq!(ranking.entries[0].place, "B");
    assert_eq!(ranking.entries[1].average, 3.0);
    assert_eq!(ranking.to_string(), h.ledger.get_rating().await.unwrap());
}

#[tokio::test]
async fn unbounded_policy_accepts_any_grade() {
    let config = LedgerConfig::default().with_grade_policy(GradePolicy::Unbounded);
    let ledger = RatingLedger::with_config(InMemoryStateStore::new(), config);

    ledger.create_rating("neg", "A", -50, "").await.unwrap();
    ledger.create_rating("big", "A", 1_000, "").await.unwrap();

    assert_eq!(
        ledger.calculate_average_grade_for_place("A").await.unwrap(),
        475.0
    );
}

#[tokio::test]
async fn records_written_elsewhere_are_readable() {
    let h = TestHarness::new();
    h.store
        .put_unconditional(
            "asset1700000000000",
            br#"{"Id":"asset1700000000000","Place":"Faro","Grade":99,"Comment":"legacy"}"#
                .to_vec(),
        )
        .await
        .unwrap();

    // Stored grades are not re-validated on read.
    let rating = h.ledger.read_rating("asset1700000000000").await.unwrap();
    assert_eq!(rating.grade, 99);
    assert_eq!(
        h.ledger.get_ratings_for_place("Faro").await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn notifications_for_each_mutation() {
    let h = TestHarness::new();
    let mut rx = h.ledger.subscribe();

    h.ledger.create_rating("r1", "A", 1, "").await.unwrap();
    h.ledger.update_rating("r1", "A", 2, "").await.unwrap();
    h.ledger.delete_rating("r1").await.unwrap();

    let kinds = [
        rx.recv().await.unwrap().kind,
        rx.recv().await.unwrap().kind,
        rx.recv().await.unwrap().kind,
    ];
    assert_eq!(
        kinds,
        [
            LedgerEventKind::RatingCreated,
            LedgerEventKind::RatingUpdated,
            LedgerEventKind::RatingDeleted
        ]
    );
}

#[tokio::test]
async fn store_errors_pass_through() {
    let ledger = RatingLedger::new(UnavailableStore);

    assert!(matches!(
        ledger.rating_exists("r1").await,
        Err(LedgerError::Store(StateStoreError::Database(_)))
    ));
    assert!(matches!(
        ledger.create_rating("r1", "A", 1, "").await,
        Err(LedgerError::Store(_))
    ));
    assert!(matches!(
        ledger.get_all_ratings().await,
        Err(LedgerError::Store(_))
    ));
    assert!(matches!(
        ledger.are_ratings_empty().await,
        Err(LedgerError::Store(_))
    ));
}

#[tokio::test]
async fn create_race_surfaces_as_already_exists() {
    let ledger = RatingLedger::new(RacingStore::default());

    // The probe sees no key, then a rival writes it before the ledger does.
    let result = ledger.create_rating("r1", "A", 3, "").await;
    assert!(matches!(result, Err(LedgerError::AlreadyExists(_))));
}

#[tokio::test]
async fn update_race_surfaces_as_not_found() {
    let store = RacingStore::default();
    store
        .inner
        .put_unconditional("r1", Rating::new("r1", "A", 3, "").encode().unwrap())
        .await
        .unwrap();
    let ledger = RatingLedger::new(store.clone());

    // The probe sees the key, then it is deleted before the overwrite.
    let result = ledger.update_rating("r1", "B", 4, "").await;
    assert!(matches!(result, Err(LedgerError::NotFound(_))));
    assert!(!store.inner.exists("r1").await.unwrap());
}

#[tokio::test]
async fn delete_race_surfaces_as_not_found() {
    let store = RacingStore::default();
    store
        .inner
        .put_unconditional("r1", Rating::new("r1", "A", 3, "").encode().unwrap())
        .await
        .unwrap();
    let ledger = RatingLedger::new(store.clone());
    let mut events = ledger.subscribe();

    // The probe sees the key, then a rival removes it before the delete.
    let result = ledger.delete_rating("r1").await;
    assert!(matches!(result, Err(LedgerError::NotFound(_))));
    assert!(!store.inner.exists("r1").await.unwrap());
    assert!(events.try_recv().is_err());
}
