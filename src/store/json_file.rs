//! JSON File Store
//!
//! Durable adapter that keeps the table in memory and rewrites a JSON file
//! after every mutation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::record::upsert;
use super::traits::{DurableStore, StoreResult};
use super::DurableRecord;

// == JSON File Store ==
/// File-backed durable store.
///
/// A mutation is applied to the in-memory table in place, then the whole
/// table is written to a temporary file and renamed over the target. If the
/// write fails the touched ids are restored, so a failed call leaves both
/// the table and the file as they were.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    table: Mutex<HashMap<String, DurableRecord>>,
}

impl JsonFileStore {
    // == Open ==
    /// Opens the store at `path`, loading any existing records.
    ///
    /// A missing file is an empty store; the file is created on first write.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let table = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => {
                let records: Vec<DurableRecord> = serde_json::from_slice(&bytes)?;
                records.into_iter().map(|r| (r.id.clone(), r)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        info!("Opened JSON store at {} with {} records", path.display(), table.len());

        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the already-mutated `table` to disk. If the write fails, the
    /// `undo` entries (prior state per touched id, oldest first) are restored.
    async fn commit(
        &self,
        table: &mut HashMap<String, DurableRecord>,
        undo: Vec<(String, Option<DurableRecord>)>,
    ) -> StoreResult<()> {
        if let Err(e) = self.persist(table).await {
            warn!("Failed to persist JSON store, reverting {} ids: {}", undo.len(), e);
            for (id, previous) in undo.into_iter().rev() {
                match previous {
                    Some(record) => table.insert(id, record),
                    None => table.remove(&id),
                };
            }
            return Err(e);
        }
        Ok(())
    }

    async fn persist(&self, table: &HashMap<String, DurableRecord>) -> StoreResult<()> {
        let mut records: Vec<&DurableRecord> = table.values().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        let bytes = serde_json::to_vec_pretty(&records)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!("Persisted {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl DurableStore for JsonFileStore {
    async fn get(&self, id: &str) -> StoreResult<Option<DurableRecord>> {
        Ok(self.table.lock().await.get(id).cloned())
    }

    async fn put(&self, id: &str, value: &str) -> StoreResult<()> {
        let mut table = self.table.lock().await;
        let undo = vec![(id.to_string(), table.get(id).cloned())];
        upsert(&mut table, id, value);
        self.commit(&mut table, undo).await
    }

    async fn put_all(&self, records: &[(String, String)]) -> StoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut table = self.table.lock().await;
        let mut undo = Vec::with_capacity(records.len());
        for (id, value) in records {
            undo.push((id.clone(), table.get(id).cloned()));
            upsert(&mut table, id, value);
        }
        self.commit(&mut table, undo).await
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let mut table = self.table.lock().await;
        let Some(previous) = table.remove(id) else {
            return Ok(false);
        };
        self.commit(&mut table, vec![(id.to_string(), Some(previous))])
            .await?;
        Ok(true)
    }

    async fn delete_all(&self, ids: &[String]) -> StoreResult<()> {
        let mut table = self.table.lock().await;
        let undo: Vec<_> = ids
            .iter()
            .filter_map(|id| table.remove(id).map(|r| (id.clone(), Some(r))))
            .collect();
        if undo.is_empty() {
            return Ok(());
        }
        self.commit(&mut table, undo).await
    }

    async fn delete_all_records(&self) -> StoreResult<()> {
        let mut table = self.table.lock().await;
        let previous = std::mem::take(&mut *table);
        if let Err(e) = self.persist(&table).await {
            warn!("Failed to persist JSON store, restoring {} records: {}", previous.len(), e);
            *table = previous;
            return Err(e);
        }
        Ok(())
    }

    async fn list_all(&self) -> StoreResult<Vec<DurableRecord>> {
        Ok(self.table.lock().await.values().cloned().collect())
    }
}
