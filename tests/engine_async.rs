//! Integration Tests for the Write-Back (async) Strategy
//!
//! Flushes are driven explicitly with `flush_now`, or by shutting the engine
//! down, so the tests never wait on the background interval.

mod common;

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use common::FlakyStore;
use overflow_cache::store::DurableStore;
use overflow_cache::{CacheEngine, CacheError, WriteBackEngine};
use tokio_test::{assert_err, assert_ok};

const NEVER: Duration = Duration::from_secs(3600);

// == Helper Functions ==

async fn engine_with(store: Arc<FlakyStore>, capacity: usize) -> WriteBackEngine {
    let engine = WriteBackEngine::new(NonZeroUsize::new(capacity).unwrap(), NEVER, store);
    assert_ok!(engine.initialize().await);
    engine
}

async fn add(engine: &WriteBackEngine, key: &str, value: &str) {
    assert_ok!(engine.add(key.to_string(), value.to_string()).await);
}

async fn stored_value(store: &FlakyStore, key: &str) -> Option<String> {
    store.inner.get(key).await.unwrap().map(|record| record.value)
}

// == Eviction and Flush ==

#[tokio::test]
async fn test_eviction_is_deferred_until_flush() {
    let store = Arc::new(FlakyStore::new());
    let engine = engine_with(store.clone(), 3).await;

    for i in 1..=4 {
        add(&engine, &format!("k{}", i), &format!("v{}", i)).await;
    }

    assert_eq!(store.puts(), 0);
    assert_eq!(engine.pending_len(), 1);
    assert_eq!(engine.overflow_len().await, 1);
    assert_eq!(assert_ok!(engine.fetch("k2").await).value, "v2");

    let report = engine.flush_now().await;

    assert_eq!(report.upserted, 1);
    assert_eq!(stored_value(&store, "k1").await.as_deref(), Some("v1"));
    assert_eq!(engine.pending_len(), 0);
}

#[tokio::test]
async fn test_fetch_from_overflow_deletes_store_copy_on_flush() {
    let store = Arc::new(FlakyStore::new());
    let engine = engine_with(store.clone(), 1).await;
    add(&engine, "k1", "v1").await;
    add(&engine, "k2", "v2").await;
    engine.flush_now().await;
    assert_eq!(stored_value(&store, "k1").await.as_deref(), Some("v1"));

    assert_eq!(assert_ok!(engine.fetch("k1").await).value, "v1");
    let report = engine.flush_now().await;

    assert_eq!(report.upserted, 1);
    assert_eq!(report.deleted, 1);
    assert_eq!(stored_value(&store, "k1").await, None);
    assert_eq!(stored_value(&store, "k2").await.as_deref(), Some("v2"));
}

#[tokio::test]
async fn test_repeated_churn_collapses_to_latest_state() {
    let store = Arc::new(FlakyStore::new());
    let engine = engine_with(store.clone(), 1).await;

    add(&engine, "a", "1").await;
    add(&engine, "b", "2").await;
    assert_ok!(engine.fetch("a").await);
    assert_ok!(engine.fetch("b").await);
    add(&engine, "a", "3").await;

    engine.flush_now().await;

    assert_eq!(engine.keys_by_recency().await, vec!["a"]);
    assert_eq!(stored_value(&store, "b").await.as_deref(), Some("2"));
    assert_eq!(stored_value(&store, "a").await, None);
    assert_eq!(store.inner.len().await, 1);
}

#[tokio::test]
async fn test_initialize_loads_existing_store() {
    let store = Arc::new(FlakyStore::with_records(&[("old", "x"), ("older", "y")]));
    let engine = engine_with(store.clone(), 2).await;

    assert_eq!(engine.overflow_len().await, 2);
    assert_eq!(assert_ok!(engine.fetch("old").await).value, "x");
    assert_eq!(engine.stats().await.store_hits, 1);
    assert_ok!(engine.remove("older").await);

    engine.flush_now().await;
    assert!(store.inner.is_empty().await);
}

// == Store Failures ==

#[tokio::test]
async fn test_failed_flush_requeues_and_retries() {
    let store = Arc::new(FlakyStore::new());
    let engine = engine_with(store.clone(), 1).await;
    add(&engine, "a", "1").await;
    add(&engine, "b", "2").await;

    store.set_failing(true);
    let report = engine.flush_now().await;

    assert_eq!(report.requeued, 1);
    assert_eq!(engine.pending_len(), 1);
    assert_eq!(engine.stats().await.flush_failures, 1);
    assert_eq!(assert_ok!(engine.fetch("b").await).value, "2");

    store.set_failing(false);
    let report = engine.flush_now().await;

    assert_eq!(report.upserted, 1);
    assert_eq!(stored_value(&store, "a").await.as_deref(), Some("1"));
    assert_eq!(engine.stats().await.flushes, 1);
}

#[tokio::test]
async fn test_failed_remove_all_keeps_overflow() {
    let store = Arc::new(FlakyStore::new());
    let engine = engine_with(store.clone(), 1).await;
    add(&engine, "a", "1").await;
    add(&engine, "b", "2").await;

    store.set_failing(true);
    assert!(matches!(engine.remove_all().await, Err(CacheError::Store(_))));
    assert_eq!(engine.len().await, 1);
    assert_eq!(engine.overflow_len().await, 1);

    store.set_failing(false);
    assert_ok!(engine.remove_all().await);
    assert_eq!(engine.len().await, 0);
    assert_eq!(engine.overflow_len().await, 0);
    assert_eq!(engine.pending_len(), 0);

    engine.flush_now().await;
    assert!(store.inner.is_empty().await);
}

// == Lifecycle ==

#[tokio::test]
async fn test_shutdown_flushes_pending_keys() {
    let store = Arc::new(FlakyStore::new());
    let engine = engine_with(store.clone(), 1).await;
    add(&engine, "a", "1").await;
    add(&engine, "b", "2").await;

    assert_ok!(engine.shutdown().await);

    assert_eq!(engine.pending_len(), 0);
    assert_eq!(stored_value(&store, "a").await.as_deref(), Some("1"));
    assert_ok!(engine.shutdown().await);
}

#[tokio::test]
async fn test_background_flusher_persists_overflow() {
    let store = Arc::new(FlakyStore::new());
    let engine =
        WriteBackEngine::new(NonZeroUsize::MIN, Duration::from_millis(20), store.clone());
    assert_ok!(engine.initialize().await);
    add(&engine, "a", "1").await;
    add(&engine, "b", "2").await;

    for _ in 0..100 {
        if stored_value(&store, "a").await.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(stored_value(&store, "a").await.as_deref(), Some("1"));
    assert_ok!(engine.shutdown().await);
}

#[tokio::test]
async fn test_failed_final_flush_is_reported_and_retried() {
    let store = Arc::new(FlakyStore::new());
    let engine = engine_with(store.clone(), 1).await;
    add(&engine, "a", "1").await;
    add(&engine, "b", "2").await;

    store.set_failing(true);
    let result = engine.shutdown().await;

    assert!(matches!(result, Err(CacheError::Store(_))));
    assert_eq!(engine.pending_len(), 1);
    assert_eq!(stored_value(&store, "a").await, None);

    store.set_failing(false);
    assert_ok!(engine.initialize().await);
    assert_eq!(engine.overflow_len().await, 1);
    assert_ok!(engine.shutdown().await);

    assert_eq!(engine.pending_len(), 0);
    assert_eq!(stored_value(&store, "a").await.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_operations_after_shutdown_are_refused() {
    let store = Arc::new(FlakyStore::new());
    let engine = engine_with(store.clone(), 1).await;
    assert_ok!(engine.shutdown().await);

    let result = engine.add("a".to_string(), "1".to_string()).await;
    assert!(matches!(result, Err(CacheError::NotInitialized)));
    assert_err!(engine.fetch("a").await);
    assert_err!(engine.remove("a").await);
    assert_err!(engine.clear().await);
    assert_err!(engine.remove_all().await);
    assert_eq!(engine.pending_len(), 0);
}

// == Concurrency ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_with_running_flusher_converge() {
    let store = Arc::new(FlakyStore::new());
    let engine = Arc::new(WriteBackEngine::new(
        NonZeroUsize::new(4).unwrap(),
        Duration::from_millis(1),
        store.clone(),
    ));
    assert_ok!(engine.initialize().await);

    let mut tasks = Vec::new();
    for t in 0..8usize {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..300usize {
                let key = format!("k{}", (i * 7 + t * 3) % 16);
                match (i + t) % 3 {
                    0 => {
                        assert_ok!(engine.add(key, format!("v{}-{}", t, i)).await);
                    }
                    1 => {
                        let result = engine.fetch(&key).await;
                        assert!(matches!(result, Ok(_) | Err(CacheError::NotFound(_))));
                    }
                    _ => {
                        let result = engine.remove(&key).await;
                        assert!(matches!(result, Ok(()) | Err(CacheError::NotFound(_))));
                    }
                }
                if i % 50 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        }));
    }
    for task in tasks {
        assert_ok!(task.await);
    }
    assert_ok!(engine.shutdown().await);

    let cached: HashSet<String> = engine.keys_by_recency().await.into_iter().collect();
    let stored: HashSet<String> = store
        .inner
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|record| record.id)
        .collect();
    assert!(cached.len() <= 4);
    assert!(cached.is_disjoint(&stored), "cached {:?} stored {:?}", cached, stored);
    assert_eq!(stored.len(), engine.overflow_len().await);
    assert_eq!(engine.pending_len(), 0);
    assert_eq!(store.max_in_flight(), 1, "flush cycles never overlap");
}
