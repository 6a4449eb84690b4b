use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{EntityId, Record, Result, StoreError, Version, store::RecordStore};

/// In-memory record store implementation.
///
/// Stores all records in a map behind a single write lock so that the
/// conditional update and delete primitives are atomic. Provides the same
/// interface as the PostgreSQL implementation; used in tests and as the
/// default backing store of the API binary.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<HashMap<(String, Uuid), Record>>>,
}

impl InMemoryRecordStore {
    /// Creates a new empty in-memory record store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records stored.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

fn key(kind: &str, id: EntityId) -> (String, Uuid) {
    (kind.to_string(), id.as_uuid())
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, record: Record) -> Result<()> {
        let mut records = self.records.write().await;
        let k = key(&record.kind, record.id);

        if records.contains_key(&k) {
            return Err(StoreError::DuplicateKey {
                kind: record.kind.clone(),
                id: record.id,
            });
        }

        let mut record = record;
        record.version = Version::first();
        record.updated_at = Utc::now();
        records.insert(k, record);
        Ok(())
    }

    async fn get(&self, kind: &str, id: EntityId) -> Result<Option<Record>> {
        let records = self.records.read().await;
        Ok(records.get(&key(kind, id)).cloned())
    }

    async fn update(
        &self,
        kind: &str,
        id: EntityId,
        expected: Version,
        payload: serde_json::Value,
    ) -> Result<Version> {
        let mut records = self.records.write().await;

        let record = records
            .get_mut(&key(kind, id))
            .ok_or_else(|| StoreError::NotFound {
                kind: kind.to_string(),
                id,
            })?;

        if record.version != expected {
            metrics::counter!("record_store_version_conflicts_total").increment(1);
            return Err(StoreError::VersionConflict {
                kind: kind.to_string(),
                id,
                expected,
                actual: record.version,
            });
        }

        record.version = expected.next();
        record.payload = payload;
        record.updated_at = Utc::now();
        Ok(record.version)
    }

    async fn delete(&self, kind: &str, id: EntityId, expected: Version) -> Result<()> {
        let mut records = self.records.write().await;
        let k = key(kind, id);

        let record = records.get(&k).ok_or_else(|| StoreError::NotFound {
            kind: kind.to_string(),
            id,
        })?;

        if record.version != expected {
            metrics::counter!("record_store_version_conflicts_total").increment(1);
            return Err(StoreError::VersionConflict {
                kind: kind.to_string(),
                id,
                expected,
                actual: record.version,
            });
        }

        records.remove(&k);
        Ok(())
    }

    async fn list(&self, kind: &str) -> Result<Vec<Record>> {
        let records = self.records.read().await;
        let mut matching: Vec<_> = records
            .values()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        Ok(matching)
    }
}
