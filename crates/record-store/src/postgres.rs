use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{EntityId, Record, Result, StoreError, Version, store::RecordStore};

/// PostgreSQL-backed record store implementation.
///
/// Records live in a single `records` table keyed by `(kind, id)`. The
/// conditional update and delete primitives are expressed as
/// `UPDATE/DELETE ... WHERE version = $expected` so the check and the write
/// are one statement; a zero row count means the caller lost the race.
#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Creates a new PostgreSQL record store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_record(row: PgRow) -> Result<Record> {
        Ok(Record {
            id: EntityId::from_uuid(row.try_get::<Uuid, _>("id")?),
            kind: row.try_get("kind")?,
            version: Version::new(row.try_get("version")?),
            payload: row.try_get("payload")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }

    /// Fetches the current version, for distinguishing a lost race from a
    /// deleted record after a zero-row conditional write.
    async fn current_version(&self, kind: &str, id: EntityId) -> Result<Option<Version>> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM records WHERE kind = $1 AND id = $2")
                .bind(kind)
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        Ok(version.map(Version::new))
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn insert(&self, record: Record) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO records (kind, id, version, payload, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (kind, id) DO NOTHING
            "#,
        )
        .bind(&record.kind)
        .bind(record.id.as_uuid())
        .bind(Version::first().as_i64())
        .bind(&record.payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DuplicateKey {
                kind: record.kind,
                id: record.id,
            });
        }

        Ok(())
    }

    async fn get(&self, kind: &str, id: EntityId) -> Result<Option<Record>> {
        let row = sqlx::query(
            r#"
            SELECT kind, id, version, payload, updated_at
            FROM records
            WHERE kind = $1 AND id = $2
            "#,
        )
        .bind(kind)
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn update(
        &self,
        kind: &str,
        id: EntityId,
        expected: Version,
        payload: serde_json::Value,
    ) -> Result<Version> {
        let new_version = expected.next();

        let result = sqlx::query(
            r#"
            UPDATE records
            SET version = $1, payload = $2, updated_at = $3
            WHERE kind = $4 AND id = $5 AND version = $6
            "#,
        )
        .bind(new_version.as_i64())
        .bind(&payload)
        .bind(Utc::now())
        .bind(kind)
        .bind(id.as_uuid())
        .bind(expected.as_i64())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            metrics::counter!("record_store_version_conflicts_total").increment(1);
            tracing::debug!(kind, %id, %expected, "conditional update matched no row");
            return match self.current_version(kind, id).await? {
                Some(actual) => Err(StoreError::VersionConflict {
                    kind: kind.to_string(),
                    id,
                    expected,
                    actual,
                }),
                None => Err(StoreError::NotFound {
                    kind: kind.to_string(),
                    id,
                }),
            };
        }

        Ok(new_version)
    }

    async fn delete(&self, kind: &str, id: EntityId, expected: Version) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM records WHERE kind = $1 AND id = $2 AND version = $3",
        )
        .bind(kind)
        .bind(id.as_uuid())
        .bind(expected.as_i64())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            metrics::counter!("record_store_version_conflicts_total").increment(1);
            return match self.current_version(kind, id).await? {
                Some(actual) => Err(StoreError::VersionConflict {
                    kind: kind.to_string(),
                    id,
                    expected,
                    actual,
                }),
                None => Err(StoreError::NotFound {
                    kind: kind.to_string(),
                    id,
                }),
            };
        }

        Ok(())
    }

    async fn list(&self, kind: &str) -> Result<Vec<Record>> {
        let rows = sqlx::query(
            r#"
            SELECT kind, id, version, payload, updated_at
            FROM records
            WHERE kind = $1
            ORDER BY updated_at ASC
            "#,
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }
}
