use std::collections::VecDeque;

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    KeyRange, KvPair, Result, StateStoreError,
    store::{KvStream, PutOptions, StateStore, WriteCondition, validate_key},
};

// Keys are compared and ordered with the "C" collation so that scan order
// matches byte order regardless of the database locale. `$3` is the last key
// of the previous batch.
const SCAN_BATCH: &str = r#"
    SELECT key, value FROM world_state
    WHERE ($1::TEXT IS NULL OR key COLLATE "C" >= $1)
      AND ($2::TEXT IS NULL OR key COLLATE "C" < $2)
      AND ($3::TEXT IS NULL OR key COLLATE "C" > $3)
    ORDER BY key COLLATE "C" ASC
    LIMIT $4
"#;

const SCAN_BATCH_SIZE: usize = 256;

/// Keyset-paginated scan state. Owns its pool handle so the stream does not
/// borrow the store.
struct ScanCursor {
    pool: PgPool,
    range: KeyRange,
    after: Option<String>,
    buffer: VecDeque<KvPair>,
    exhausted: bool,
}

impl ScanCursor {
    fn new(pool: PgPool, range: KeyRange) -> Self {
        Self {
            pool,
            range,
            after: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    async fn fetch_batch(&mut self) -> Result<()> {
        let rows = sqlx::query(SCAN_BATCH)
            .bind(self.range.start.clone())
            .bind(self.range.end.clone())
            .bind(self.after.clone())
            .bind(SCAN_BATCH_SIZE as i64)
            .fetch_all(&self.pool)
            .await?;

        self.absorb(rows.into_iter().map(PostgresStateStore::row_to_pair).collect())
    }

    /// Buffers one fetched batch. A batch containing an undecodable row is
    /// dropped whole.
    fn absorb(&mut self, batch: Vec<Result<KvPair>>) -> Result<()> {
        if batch.len() < SCAN_BATCH_SIZE {
            self.exhausted = true;
        }
        let pairs = batch.into_iter().collect::<Result<Vec<_>>>()?;
        if let Some(last) = pairs.last() {
            self.after = Some(last.key.clone());
        }
        self.buffer.extend(pairs);
        Ok(())
    }

    async fn next_pair(mut self) -> Option<(Result<KvPair>, Self)> {
        loop {
            if let Some(pair) = self.buffer.pop_front() {
                return Some((Ok(pair), self));
            }
            if self.exhausted {
                return None;
            }
            if let Err(e) = self.fetch_batch().await {
                self.buffer.clear();
                self.exhausted = true;
                return Some((Err(e), self));
            }
        }
    }
}

/// PostgreSQL-backed world state.
#[derive(Clone)]
pub struct PostgresStateStore {
    pool: PgPool,
}

impl PostgresStateStore {
    /// Creates a new PostgreSQL state store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("world state migrations applied");
        Ok(())
    }

    fn row_to_pair(row: PgRow) -> Result<KvPair> {
        Ok(KvPair {
            key: row.try_get("key")?,
            value: row.try_get("value")?,
        })
    }
}

#[async_trait]
impl StateStore for PostgresStateStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value: Option<Vec<u8>> =
            sqlx::query_scalar("SELECT value FROM world_state WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: Vec<u8>, options: PutOptions) -> Result<()> {
        validate_key(key)?;

        let result = match options.condition {
            WriteCondition::Any => {
                sqlx::query(
                    r#"
                    INSERT INTO world_state (key, value, updated_at)
                    VALUES ($1, $2, NOW())
                    ON CONFLICT (key) DO UPDATE SET
                        value = EXCLUDED.value,
                        updated_at = EXCLUDED.updated_at
                    "#,
                )
                .bind(key)
                .bind(value)
                .execute(&self.pool)
                .await?
            }
            WriteCondition::MustNotExist => {
                sqlx::query(
                    r#"
                    INSERT INTO world_state (key, value, updated_at)
                    VALUES ($1, $2, NOW())
                    ON CONFLICT (key) DO NOTHING
                    "#,
                )
                .bind(key)
                .bind(value)
                .execute(&self.pool)
                .await?
            }
            WriteCondition::MustExist => {
                sqlx::query("UPDATE world_state SET value = $2, updated_at = NOW() WHERE key = $1")
                    .bind(key)
                    .bind(value)
                    .execute(&self.pool)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            metrics::counter!("world_state_condition_failures").increment(1);
            tracing::debug!(key, condition = %options.condition, "conditional write rejected");
            return Err(StateStoreError::ConditionFailed {
                key: key.to_string(),
                condition: options.condition,
            });
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM world_state WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn scan_range(&self, range: KeyRange) -> Result<KvStream> {
        use futures_util::stream;

        let cursor = ScanCursor::new(self.pool.clone(), range);
        Ok(Box::pin(stream::unfold(cursor, ScanCursor::next_pair)))
    }
}
