//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use overflow_cache::store::{DurableRecord, DurableStore, MemoryStore, StoreError, StoreResult};

/// Wraps a [`MemoryStore`], counting writes and failing on demand.
///
/// Also records the highest number of writes that were in flight at once.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing: AtomicBool,
    puts: AtomicUsize,
    deletes: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: &[(&str, &str)]) -> Self {
        Self {
            inner: MemoryStore::with_records(records.iter().copied()),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Records written, counting each record of a bulk write.
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Most writes ever observed running concurrently.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn write<F: Future>(&self, op: F) -> F::Output {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        // Give an overlapping writer the chance to show up
        tokio::task::yield_now().await;
        let out = op.await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        out
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DurableStore for FlakyStore {
    async fn get(&self, id: &str) -> StoreResult<Option<DurableRecord>> {
        self.check()?;
        self.inner.get(id).await
    }

    async fn put(&self, id: &str, value: &str) -> StoreResult<()> {
        self.check()?;
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.write(self.inner.put(id, value)).await
    }

    async fn put_all(&self, records: &[(String, String)]) -> StoreResult<()> {
        self.check()?;
        self.puts.fetch_add(records.len(), Ordering::SeqCst);
        self.write(self.inner.put_all(records)).await
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        self.check()?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.write(self.inner.delete(id)).await
    }

    async fn delete_all(&self, ids: &[String]) -> StoreResult<()> {
        self.check()?;
        self.deletes.fetch_add(ids.len(), Ordering::SeqCst);
        self.write(self.inner.delete_all(ids)).await
    }

    async fn delete_all_records(&self) -> StoreResult<()> {
        self.check()?;
        self.write(self.inner.delete_all_records()).await
    }

    async fn list_all(&self) -> StoreResult<Vec<DurableRecord>> {
        self.check()?;
        self.inner.list_all().await
    }
}
