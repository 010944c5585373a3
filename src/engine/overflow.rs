//! Overflow Module
//!
//! Pending write-back work for the asynchronous strategy: an in-memory mirror
//! of what the durable store should hold, plus the queue of keys whose store
//! state has not been reconciled yet.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, RwLock, RwLockWriteGuard};
use tracing::{debug, warn};

use crate::store::{DurableStore, StoreResult};

// == Overflow Buffer ==
/// FIFO worklist of keys awaiting write-back. Duplicates are allowed; the
/// buffer holds no values.
#[derive(Debug, Default)]
pub struct OverflowBuffer {
    keys: Mutex<VecDeque<String>>,
}

impl OverflowBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn keys(&self) -> MutexGuard<'_, VecDeque<String>> {
        // The queue is valid after any panic mid-push, so poisoning is ignored.
        self.keys.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn enqueue(&self, key: impl Into<String>) {
        self.keys().push_back(key.into());
    }

    /// Takes every queued key in one step.
    pub fn drain(&self) -> Vec<String> {
        self.keys().drain(..).collect()
    }

    /// Puts keys back after a failed flush.
    pub fn requeue(&self, keys: impl IntoIterator<Item = String>) {
        self.keys().extend(keys);
    }

    pub fn clear(&self) {
        self.keys().clear();
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }
}

// == Flush Report ==
/// Outcome of one flush cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Records upserted into the store
    pub upserted: usize,
    /// Keys deleted from the store
    pub deleted: usize,
    /// Keys put back on the buffer after a store failure
    pub requeued: usize,
}

// == Overflow Store ==
/// Mirror of the durable store plus the pending-key buffer.
///
/// By construction a key is never in both the mirror and the bounded cache at
/// a quiescent point, so the flush rule "in the mirror → upsert, otherwise →
/// delete" never persists a cache-resident key.
pub struct OverflowStore {
    mirror: RwLock<HashMap<String, String>>,
    pending: OverflowBuffer,
    store: Arc<dyn DurableStore>,
    /// Serializes flush cycles against `purge`
    flush_gate: AsyncMutex<()>,
    flushes: AtomicU64,
    flush_failures: AtomicU64,
}

impl OverflowStore {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self {
            mirror: RwLock::new(HashMap::new()),
            pending: OverflowBuffer::new(),
            store,
            flush_gate: AsyncMutex::new(()),
            flushes: AtomicU64::new(0),
            flush_failures: AtomicU64::new(0),
        }
    }

    /// Replaces the mirror with the durable store's current contents.
    pub async fn load(&self) -> StoreResult<usize> {
        let records = self.store.list_all().await?;
        let mut mirror = self.mirror.write().await;
        mirror.clear();
        mirror.extend(records.into_iter().map(|r| (r.id, r.value)));
        Ok(mirror.len())
    }

    /// Exclusive access to the mirror for one engine operation.
    pub async fn lock(&self) -> MirrorGuard<'_> {
        MirrorGuard {
            mirror: self.mirror.write().await,
            pending: &self.pending,
        }
    }

    /// Deletes everything from the store, then forgets all mirrored and
    /// pending state. Nothing is forgotten if the store call fails.
    pub async fn purge(&self) -> StoreResult<()> {
        let _gate = self.flush_gate.lock().await;
        self.store.delete_all_records().await?;
        self.mirror.write().await.clear();
        self.pending.clear();
        Ok(())
    }

    pub fn pending(&self) -> &OverflowBuffer {
        &self.pending
    }

    pub async fn mirrored_len(&self) -> usize {
        self.mirror.read().await.len()
    }

    pub fn flushes(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    pub fn flush_failures(&self) -> u64 {
        self.flush_failures.load(Ordering::Relaxed)
    }

    // == Flush ==
    /// Runs one flush cycle.
    ///
    /// Drains the buffer, resolves each key against the mirror under a read
    /// lock, then issues one bulk upsert and one bulk delete. On any store
    /// failure every drained key is requeued for the next cycle.
    pub async fn flush(&self) -> FlushReport {
        let _gate = self.flush_gate.lock().await;

        let keys = self.pending.drain();
        if keys.is_empty() {
            return FlushReport::default();
        }

        let (upserts, deletes) = {
            let mirror = self.mirror.read().await;
            let mut seen = HashSet::with_capacity(keys.len());
            let mut upserts = Vec::new();
            let mut deletes = Vec::new();
            for key in keys.iter().filter(|k| seen.insert(k.as_str())) {
                match mirror.get(key) {
                    Some(value) => upserts.push((key.clone(), value.clone())),
                    None => deletes.push(key.clone()),
                }
            }
            (upserts, deletes)
        };
        debug!(
            "Prepared {} records to save and {} ids to delete from store",
            upserts.len(),
            deletes.len()
        );

        match self.write_batches(&upserts, &deletes).await {
            Ok(()) => {
                self.flushes.fetch_add(1, Ordering::Relaxed);
                FlushReport {
                    upserted: upserts.len(),
                    deleted: deletes.len(),
                    requeued: 0,
                }
            }
            Err(e) => {
                warn!("Error persisting {} overflow keys, requeueing: {}", keys.len(), e);
                self.flush_failures.fetch_add(1, Ordering::Relaxed);
                let requeued = keys.len();
                self.pending.requeue(keys);
                FlushReport {
                    requeued,
                    ..FlushReport::default()
                }
            }
        }
    }

    async fn write_batches(
        &self,
        upserts: &[(String, String)],
        deletes: &[String],
    ) -> StoreResult<()> {
        if !upserts.is_empty() {
            self.store.put_all(upserts).await?;
        }
        if !deletes.is_empty() {
            self.store.delete_all(deletes).await?;
        }
        Ok(())
    }
}

// == Mirror Guard ==
/// Write access to the mirror. Every mutation enqueues the key so the
/// flusher reconciles it with the durable store.
pub struct MirrorGuard<'a> {
    mirror: RwLockWriteGuard<'a, HashMap<String, String>>,
    pending: &'a OverflowBuffer,
}

impl MirrorGuard<'_> {
    /// Records that `key` now belongs in the store with `value`.
    pub fn stash(&mut self, key: String, value: String) {
        self.pending.enqueue(key.clone());
        self.mirror.insert(key, value);
    }

    /// Removes `key` from the store's intended contents.
    pub fn take(&mut self, key: &str) -> Option<String> {
        let value = self.mirror.remove(key)?;
        self.pending.enqueue(key);
        Some(value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.mirror.contains_key(key)
    }
}
