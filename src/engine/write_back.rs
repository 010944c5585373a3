//! Write-back (asynchronous) strategy.
//!
//! The hot path never talks to the durable store except for `remove_all`.
//! Evictions are stashed in the [`OverflowStore`] mirror and records pulled
//! back into the cache are taken out of it; a background flusher applies the
//! queued changes to the store.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

use super::overflow::{FlushReport, MirrorGuard, OverflowStore};
use super::{ensure_initialized, CacheEngine, CacheState, Strategy};
use crate::cache::{CacheRecord, CacheStats};
use crate::error::{CacheError, Result};
use crate::store::{DurableStore, StoreError};
use crate::tasks::{spawn_flush_task, FlushHandle};

// == Write-Back Engine ==
pub struct WriteBackEngine {
    state: RwLock<CacheState>,
    overflow: Arc<OverflowStore>,
    flush_interval: Duration,
    /// Running flusher; `None` before initialize and after shutdown
    flusher: Mutex<Option<FlushHandle>>,
    initialized: AtomicBool,
    /// Set once the mirror has been loaded from the store
    loaded: AtomicBool,
    capacity: usize,
}

impl WriteBackEngine {
    pub fn new(
        capacity: NonZeroUsize,
        flush_interval: Duration,
        store: Arc<dyn DurableStore>,
    ) -> Self {
        Self {
            state: RwLock::new(CacheState::new(capacity)),
            overflow: Arc::new(OverflowStore::new(store)),
            flush_interval,
            flusher: Mutex::new(None),
            initialized: AtomicBool::new(false),
            loaded: AtomicBool::new(false),
            capacity: capacity.get(),
        }
    }

    /// Runs one flush cycle now, independent of the background schedule.
    pub async fn flush_now(&self) -> FlushReport {
        self.overflow.flush().await
    }

    /// Number of keys waiting for the next flush.
    pub fn pending_len(&self) -> usize {
        self.overflow.pending().len()
    }

    /// Number of records the durable store is meant to hold once flushed.
    pub async fn overflow_len(&self) -> usize {
        self.overflow.mirrored_len().await
    }

    /// Keys in the bounded cache from least to most recently used.
    pub async fn keys_by_recency(&self) -> Vec<String> {
        self.state.read().await.lru.keys_by_recency()
    }

    // == Admit ==
    /// Makes `key` cache-resident, stashing the eviction victim if the cache is full.
    fn admit(state: &mut CacheState, overflow: &mut MirrorGuard<'_>, key: String, value: String) {
        if state.lru.needs_eviction(&key) {
            if let Some((victim_key, victim_value)) = state.lru.evict_oldest() {
                debug!("Cache at capacity, overflowing {}", victim_key);
                overflow.stash(victim_key, victim_value);
                state.stats.record_eviction();
            }
        }
        state.lru.put(key, value);
    }
}

#[async_trait]
impl CacheEngine for WriteBackEngine {
    fn strategy(&self) -> Strategy {
        Strategy::Async
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    /// Loads the overflow mirror on first use and starts the flusher.
    ///
    /// After a `shutdown` this restarts the flusher without reloading, so keys
    /// a failed final flush left queued are retried.
    async fn initialize(&self) -> Result<()> {
        let mut flusher = self.flusher.lock().await;
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }

        if !self.loaded.load(Ordering::Acquire) {
            let loaded = self.overflow.load().await.map_err(|e| {
                error!("Error initializing overflow store from durable store: {}", e);
                CacheError::from(e)
            })?;
            self.loaded.store(true, Ordering::Release);
            info!("Write-back cache engine loaded {} stored records", loaded);
        }
        *flusher = Some(spawn_flush_task(self.overflow.clone(), self.flush_interval));
        self.initialized.store(true, Ordering::Release);

        info!(
            "Write-back cache engine initialized, {} keys pending",
            self.overflow.pending().len()
        );
        Ok(())
    }

    async fn add(&self, key: String, value: String) -> Result<CacheRecord> {
        debug!("Adding cache entry - Key: {}", key);

        let mut state = self.state.write().await;
        ensure_initialized(&self.initialized)?;
        let mut overflow = self.overflow.lock().await;
        overflow.take(&key);
        Self::admit(&mut state, &mut overflow, key.clone(), value.clone());

        Ok(CacheRecord::new(key, value))
    }

    async fn fetch(&self, key: &str) -> Result<CacheRecord> {
        debug!("Fetching cache entry - Key: {}", key);

        let mut state = self.state.write().await;
        ensure_initialized(&self.initialized)?;
        if let Some(value) = state.lru.get(key).cloned() {
            state.stats.record_hit();
            return Ok(CacheRecord::new(key, value));
        }

        let mut overflow = self.overflow.lock().await;
        match overflow.take(key) {
            Some(value) => {
                Self::admit(&mut state, &mut overflow, key.to_string(), value.clone());
                state.stats.record_miss(true);
                Ok(CacheRecord::new(key, value))
            }
            None => {
                state.stats.record_miss(false);
                debug!("Record with key {} not found in cache or store", key);
                Err(CacheError::NotFound(key.to_string()))
            }
        }
    }

    async fn remove(&self, key: &str) -> Result<()> {
        debug!("Removing cache entry - Key: {}", key);

        let mut state = self.state.write().await;
        ensure_initialized(&self.initialized)?;
        if state.lru.remove(key).is_some() {
            return Ok(());
        }

        match self.overflow.lock().await.take(key) {
            Some(_) => Ok(()),
            None => Err(CacheError::NotFound(key.to_string())),
        }
    }

    async fn remove_all(&self) -> Result<()> {
        debug!("Removing all cache entries");

        let mut state = self.state.write().await;
        ensure_initialized(&self.initialized)?;
        self.overflow
            .purge()
            .await
            .inspect_err(|e| error!("Error clearing durable store: {}", e))?;
        state.lru.clear();
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        debug!("Clearing cache");

        let mut state = self.state.write().await;
        ensure_initialized(&self.initialized)?;
        state.lru.clear();
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        let mut stats = self.state.read().await.stats();
        stats.flushes = self.overflow.flushes();
        stats.flush_failures = self.overflow.flush_failures();
        stats
    }

    async fn len(&self) -> usize {
        self.state.read().await.lru.len()
    }

    /// Closes the engine to new operations, stops the flusher and drains
    /// the queue one last time.
    ///
    /// Fails if the final flush could not persist every queued key; those
    /// keys stay queued and are retried if the engine is initialized again.
    async fn shutdown(&self) -> Result<()> {
        let mut flusher = self.flusher.lock().await;
        {
            // Operations re-check the flag under this lock, so none can
            // enqueue after the final flush.
            let _state = self.state.write().await;
            self.initialized.store(false, Ordering::Release);
        }

        let Some(handle) = flusher.take() else {
            return Ok(());
        };
        info!("Stopping write-back flusher");
        let report = handle.shutdown().await.map_err(|e| {
            error!("Write-back flush task ended abnormally: {}", e);
            CacheError::Internal(format!("flush task failed: {}", e))
        })?;

        if report.requeued > 0 {
            error!(
                "Final write-back flush left {} keys unpersisted",
                report.requeued
            );
            return Err(CacheError::Store(StoreError::Unavailable(format!(
                "final write-back flush left {} keys unpersisted",
                report.requeued
            ))));
        }
        Ok(())
    }
}
