//! Cache Engine Module
//!
//! Composes the bounded LRU cache with a durable store. Two strategies share
//! one contract:
//! - `Sync` ("inline"): evictions and store removals happen inside the
//!   operation, while the engine lock is held.
//! - `Async` ("mirror"): the hot path only touches an in-memory overflow
//!   mirror and enqueues keys; a background flusher reconciles the store.

mod inline;
mod overflow;
mod write_back;


use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{BoundedLru, CacheRecord, CacheStats};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::store::DurableStore;

pub use inline::InlineEngine;
pub use overflow::{FlushReport, MirrorGuard, OverflowBuffer, OverflowStore};
pub use write_back::WriteBackEngine;

// == Strategy ==
/// Write-back strategy selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Evicted records are written to the store synchronously
    Sync,
    /// Evicted records are queued and flushed periodically
    Async,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" | "inline" => Ok(Strategy::Sync),
            "async" | "mirror" => Ok(Strategy::Async),
            other => Err(format!("unknown cache strategy '{}'", other)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Sync => f.write_str("sync"),
            Strategy::Async => f.write_str("async"),
        }
    }
}

// == Cache Engine ==
/// Operations exposed to the transport layer.
///
/// Every operation fails with [`CacheError::NotInitialized`] until
/// [`initialize`](CacheEngine::initialize) has completed. Fetch and remove
/// misses are [`CacheError::NotFound`].
#[async_trait]
pub trait CacheEngine: Send + Sync {
    fn strategy(&self) -> Strategy;

    fn capacity(&self) -> usize;

    /// Loads existing durable state. Idempotent.
    async fn initialize(&self) -> Result<()>;

    /// Inserts or replaces `key`, returning the stored record.
    async fn add(&self, key: String, value: String) -> Result<CacheRecord>;

    /// Returns the record for `key`, pulling it back from the store on a cache miss.
    async fn fetch(&self, key: &str) -> Result<CacheRecord>;

    async fn remove(&self, key: &str) -> Result<()>;

    /// Empties both the cache and the durable store.
    async fn remove_all(&self) -> Result<()>;

    /// Empties the cache only.
    async fn clear(&self) -> Result<()>;

    async fn stats(&self) -> CacheStats;

    /// Number of records currently in the bounded cache.
    async fn len(&self) -> usize;

    /// Stops background work, waiting for anything in flight.
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// Builds the engine selected by `config` on top of `store`.
pub fn build_engine(config: &Config, store: Arc<dyn DurableStore>) -> Arc<dyn CacheEngine> {
    let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
    match config.strategy {
        Strategy::Sync => Arc::new(InlineEngine::new(capacity, store)),
        Strategy::Async => Arc::new(WriteBackEngine::new(
            capacity,
            Duration::from_secs(config.flush_interval),
            store,
        )),
    }
}

// == Cache State ==
/// Everything guarded by the engine lock.
#[derive(Debug)]
pub(crate) struct CacheState {
    pub(crate) lru: BoundedLru,
    pub(crate) stats: CacheStats,
}

impl CacheState {
    pub(crate) fn new(capacity: NonZeroUsize) -> Self {
        Self {
            lru: BoundedLru::new(capacity),
            stats: CacheStats::new(),
        }
    }

    pub(crate) fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.lru.len());
        stats
    }
}

fn ensure_initialized(initialized: &AtomicBool) -> Result<()> {
    if initialized.load(Ordering::Acquire) {
        Ok(())
    } else {
        Err(CacheError::NotInitialized)
    }
}
