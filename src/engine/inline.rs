//! Inline (synchronous) write-back strategy.
//!
//! Every store round-trip happens inside the operation while the engine lock
//! is held, so the cache and the store never both hold a key across lock
//! releases.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::{ensure_initialized, CacheEngine, CacheState, Strategy};
use crate::cache::{CacheRecord, CacheStats};
use crate::error::{CacheError, Result};
use crate::store::DurableStore;

// == Inline Engine ==
pub struct InlineEngine {
    state: RwLock<CacheState>,
    store: Arc<dyn DurableStore>,
    initialized: AtomicBool,
    capacity: usize,
}

impl InlineEngine {
    pub fn new(capacity: NonZeroUsize, store: Arc<dyn DurableStore>) -> Self {
        Self {
            state: RwLock::new(CacheState::new(capacity)),
            store,
            initialized: AtomicBool::new(false),
            capacity: capacity.get(),
        }
    }

    /// Keys in the bounded cache from least to most recently used.
    pub async fn keys_by_recency(&self) -> Vec<String> {
        self.state.read().await.lru.keys_by_recency()
    }

    // == Admit ==
    /// Makes `key` cache-resident with `value`.
    ///
    /// Order: persist the eviction victim (if the cache is full), delete `key`
    /// from the store, then mutate the cache. A store failure leaves the
    /// cache untouched; if the delete fails after the victim was persisted the
    /// victim's store copy is rolled back.
    async fn admit(&self, state: &mut CacheState, key: &str, value: String) -> Result<()> {
        let victim = if state.lru.needs_eviction(key) {
            state
                .lru
                .peek_oldest()
                .map(|(k, v)| (k.clone(), v.clone()))
        } else {
            None
        };

        if let Some((victim_key, victim_value)) = &victim {
            debug!("Cache at capacity {}, persisting {} to store", self.capacity, victim_key);
            self.store.put(victim_key, victim_value).await?;
        }

        if let Err(e) = self.store.delete(key).await {
            if let Some((victim_key, _)) = &victim {
                if let Err(undo) = self.store.delete(victim_key).await {
                    warn!("Failed to roll back store copy of {}: {}", victim_key, undo);
                }
            }
            return Err(e.into());
        }

        if victim.is_some() {
            state.lru.evict_oldest();
            state.stats.record_eviction();
        }
        state.lru.put(key.to_string(), value);
        Ok(())
    }
}

#[async_trait]
impl CacheEngine for InlineEngine {
    fn strategy(&self) -> Strategy {
        Strategy::Sync
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    async fn initialize(&self) -> Result<()> {
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }
        let _state = self.state.write().await;
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }
        let records = self.store.list_all().await.map_err(|e| {
            error!("Error initializing from durable store: {}", e);
            CacheError::from(e)
        })?;
        self.initialized.store(true, Ordering::Release);
        info!("Inline cache engine initialized, {} records in store", records.len());
        Ok(())
    }

    async fn add(&self, key: String, value: String) -> Result<CacheRecord> {
        ensure_initialized(&self.initialized)?;
        debug!("Adding cache entry - Key: {}", key);

        let mut state = self.state.write().await;
        self.admit(&mut state, &key, value.clone())
            .await
            .inspect_err(|e| error!("Error adding cache entry {}: {}", key, e))?;

        Ok(CacheRecord::new(key, value))
    }

    async fn fetch(&self, key: &str) -> Result<CacheRecord> {
        ensure_initialized(&self.initialized)?;
        debug!("Fetching cache entry - Key: {}", key);

        let mut state = self.state.write().await;
        if let Some(value) = state.lru.get(key).cloned() {
            state.stats.record_hit();
            return Ok(CacheRecord::new(key, value));
        }

        let stored = self
            .store
            .get(key)
            .await
            .inspect_err(|e| error!("Error reading {} from durable store: {}", key, e))?;
        let record = match stored {
            Some(record) => record,
            None => {
                state.stats.record_miss(false);
                debug!("Record with key {} not found in cache or store", key);
                return Err(CacheError::NotFound(key.to_string()));
            }
        };

        self.admit(&mut state, key, record.value.clone())
            .await
            .inspect_err(|e| error!("Error fetching cache entry {}: {}", key, e))?;
        state.stats.record_miss(true);

        Ok(record.into())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        ensure_initialized(&self.initialized)?;
        debug!("Removing cache entry - Key: {}", key);

        let mut state = self.state.write().await;
        if state.lru.remove(key).is_some() {
            return Ok(());
        }

        if self.store.delete(key).await? {
            debug!("Record with key {} deleted from store", key);
            Ok(())
        } else {
            Err(CacheError::NotFound(key.to_string()))
        }
    }

    async fn remove_all(&self) -> Result<()> {
        ensure_initialized(&self.initialized)?;
        debug!("Removing all cache entries");

        let mut state = self.state.write().await;
        self.store.delete_all_records().await?;
        state.lru.clear();
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        ensure_initialized(&self.initialized)?;
        debug!("Clearing cache");

        self.state.write().await.lru.clear();
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        self.state.read().await.stats()
    }

    async fn len(&self) -> usize {
        self.state.read().await.lru.len()
    }
}
