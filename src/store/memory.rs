use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::record::upsert;
use super::traits::{DurableStore, StoreResult};
use super::DurableRecord;

/// In-process store adapter. Nothing survives the process; useful for tests
/// and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, DurableRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with `(id, value)` pairs.
    pub fn with_records<I, K, V>(records: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let data = records
            .into_iter()
            .map(|(k, v)| {
                let record = DurableRecord::new(k, v);
                (record.id.clone(), record)
            })
            .collect();
        Self {
            data: RwLock::new(data),
        }
    }

    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.data.read().await.contains_key(id)
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get(&self, id: &str) -> StoreResult<Option<DurableRecord>> {
        Ok(self.data.read().await.get(id).cloned())
    }

    async fn put(&self, id: &str, value: &str) -> StoreResult<()> {
        upsert(&mut *self.data.write().await, id, value);
        Ok(())
    }

    async fn put_all(&self, records: &[(String, String)]) -> StoreResult<()> {
        let mut data = self.data.write().await;
        for (id, value) in records {
            upsert(&mut data, id, value);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        Ok(self.data.write().await.remove(id).is_some())
    }

    async fn delete_all(&self, ids: &[String]) -> StoreResult<()> {
        let mut data = self.data.write().await;
        for id in ids {
            data.remove(id);
        }
        Ok(())
    }

    async fn delete_all_records(&self) -> StoreResult<()> {
        self.data.write().await.clear();
        Ok(())
    }

    async fn list_all(&self) -> StoreResult<Vec<DurableRecord>> {
        Ok(self.data.read().await.values().cloned().collect())
    }
}
