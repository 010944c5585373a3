//! Durable store contract consumed by the cache engine.

use async_trait::async_trait;
use thiserror::Error;

use super::DurableRecord;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Point CRUD over records keyed by string id.
///
/// Every call may fail with a [`StoreError`]; callers treat failures as
/// recoverable and never assume exactly-once delivery, so upserts must be
/// idempotent by id.
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn get(&self, id: &str) -> StoreResult<Option<DurableRecord>>;

    /// Inserts or replaces the record under `id`.
    async fn put(&self, id: &str, value: &str) -> StoreResult<()>;

    /// Bulk upsert of `(id, value)` pairs.
    /// Default implementation falls back to sequential puts.
    async fn put_all(&self, records: &[(String, String)]) -> StoreResult<()> {
        for (id, value) in records {
            self.put(id, value).await?;
        }
        Ok(())
    }

    /// Removes the record under `id`. Returns `false` when nothing was there;
    /// absence is not an error.
    async fn delete(&self, id: &str) -> StoreResult<bool>;

    /// Bulk delete. Missing ids are ignored.
    /// Default implementation falls back to sequential deletes.
    async fn delete_all(&self, ids: &[String]) -> StoreResult<()> {
        for id in ids {
            self.delete(id).await?;
        }
        Ok(())
    }

    async fn delete_all_records(&self) -> StoreResult<()>;

    async fn list_all(&self) -> StoreResult<Vec<DurableRecord>>;
}
