//! Cache Statistics Module
//!
//! Tracks engine metrics: hits, misses, evictions, store fallbacks and flushes.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Fetches served from the bounded cache
    pub hits: u64,
    /// Fetches that missed the bounded cache
    pub misses: u64,
    /// Misses satisfied by pulling the record back from the durable store
    pub store_hits: u64,
    /// Entries evicted and written back
    pub evictions: u64,
    /// Completed write-back flush cycles
    pub flushes: u64,
    /// Flush cycles whose keys were requeued after a store failure
    pub flush_failures: u64,
    /// Current number of entries in the bounded cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Records a cache miss; `from_store` marks it as satisfied by the store.
    pub fn record_miss(&mut self, from_store: bool) {
        self.misses += 1;
        if from_store {
            self.store_hits += 1;
        }
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
