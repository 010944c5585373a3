//! Bounded LRU Module
//!
//! Recency-ordered key/value map with a fixed capacity.

use std::fmt;
use std::num::NonZeroUsize;

use lru::LruCache;

// == Bounded LRU ==
/// Recency-ordered map with a fixed capacity.
///
/// Inserts and successful reads move a key to the most-recently-used end.
/// The map never evicts on its own: callers check [`needs_eviction`] and call
/// [`evict_oldest`] themselves, so every evicted record can be written back
/// before it is dropped.
///
/// [`needs_eviction`]: BoundedLru::needs_eviction
/// [`evict_oldest`]: BoundedLru::evict_oldest
pub struct BoundedLru {
    /// Unbounded recency list; the bound is enforced by `capacity`
    entries: LruCache<String, String>,
    capacity: NonZeroUsize,
}

impl BoundedLru {
    // == Constructor ==
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::unbounded(),
            capacity,
        }
    }

    // == Get ==
    /// Returns the value for `key` and marks it most recently used.
    pub fn get(&mut self, key: &str) -> Option<&String> {
        self.entries.get(key)
    }

    // == Put ==
    /// Inserts or overwrites `key` and marks it most recently used.
    ///
    /// Returns the previous value. Inserting a new key into a full cache
    /// breaks the capacity bound; evict first.
    pub fn put(&mut self, key: String, value: String) -> Option<String> {
        debug_assert!(
            !self.needs_eviction(&key),
            "put into a full cache without evicting"
        );
        self.entries.put(key, value)
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.pop(key)
    }

    // == Evict Oldest ==
    /// Removes and returns the least recently used entry.
    pub fn evict_oldest(&mut self) -> Option<(String, String)> {
        self.entries.pop_lru()
    }

    // == Peek Oldest ==
    /// Returns the least recently used entry without removing it.
    pub fn peek_oldest(&self) -> Option<(&String, &String)> {
        self.entries.peek_lru()
    }

    // == Needs Eviction ==
    /// True when inserting `key` would push the cache past capacity.
    pub fn needs_eviction(&self, key: &str) -> bool {
        self.is_full() && !self.contains(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity.get()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Keys from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.entries.iter().rev().map(|(k, _)| k.clone()).collect()
    }
}

impl fmt::Debug for BoundedLru {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedLru")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
