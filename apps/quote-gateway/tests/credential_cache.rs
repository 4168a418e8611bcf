//! Credential Cache Integration Tests
//!
//! Single-flight loading, failure fan-out and clearing against a store that
//! can be held mid-load.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use quote_gateway::{CacheKey, CredentialCache, SecretStoreError, SecretStorePort, SecretValue};

// Gated store: each fetch waits for a permit, then answers with the next
// queued failure or a value derived from the key and call number.
struct GatedStore {
    calls: AtomicUsize,
    gate: Semaphore,
    failures: Mutex<VecDeque<SecretStoreError>>,
}

impl GatedStore {
    fn open() -> Arc<Self> {
        Arc::new(Self::with_gate(Semaphore::MAX_PERMITS))
    }

    fn closed() -> Arc<Self> {
        Arc::new(Self::with_gate(0))
    }

    fn with_gate(permits: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            gate: Semaphore::new(permits),
            failures: Mutex::new(VecDeque::new()),
        }
    }

    fn fail_next(&self, error: SecretStoreError) {
        self.failures.lock().push_back(error);
    }

    fn release(&self, loads: usize) {
        self.gate.add_permits(loads);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStorePort for GatedStore {
    async fn fetch(&self, key: &CacheKey) -> Result<SecretValue, SecretStoreError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.gate.acquire().await.unwrap().forget();

        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }
        Ok(SecretValue::new(format!(
            "{}-{}-v{call}",
            key.secret_id(),
            key.version()
        )))
    }
}

fn cache_over(store: &Arc<GatedStore>) -> Arc<CredentialCache> {
    Arc::new(CredentialCache::new(Arc::clone(store) as Arc<dyn SecretStorePort>))
}

async fn wait_for_calls(store: &GatedStore, expected: usize) {
    timeout(Duration::from_secs(2), async {
        while store.calls() < expected {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("store was not called in time");
}

#[tokio::test]
async fn concurrent_misses_share_one_load() {
    let store = GatedStore::closed();
    let cache = cache_over(&store);

    let waiters: Vec<_> = (0..10)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get("stock-api", "alphavantage-api-key", None).await })
        })
        .collect();

    wait_for_calls(&store, 1).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    store.release(1);

    for waiter in waiters {
        let value = waiter.await.unwrap().unwrap();
        assert_eq!(value.expose(), "alphavantage-api-key-latest-v1");
    }
    assert_eq!(store.calls(), 1);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn failure_reaches_every_waiter_and_is_not_cached() {
    let store = GatedStore::closed();
    store.fail_next(SecretStoreError::PermissionDenied {
        message: "secretAccessor missing".to_string(),
    });
    let cache = cache_over(&store);

    let waiters: Vec<_> = (0..5)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get("stock-api", "stockdata-api-token", None).await })
        })
        .collect();

    wait_for_calls(&store, 1).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    store.release(1);

    for waiter in waiters {
        let err = waiter.await.unwrap().unwrap_err();
        assert_eq!(err.kind(), "permission_denied");
        assert!(err.to_string().contains("secretAccessor missing"));
    }
    assert_eq!(store.calls(), 1);
    assert!(cache.is_empty());

    // Next lookup retries the store.
    store.release(1);
    let value = cache
        .get("stock-api", "stockdata-api-token", None)
        .await
        .unwrap();
    assert_eq!(value.expose(), "stockdata-api-token-latest-v2");
    assert_eq!(store.calls(), 2);
}

#[tokio::test]
async fn keys_are_loaded_independently() {
    let store = GatedStore::open();
    let cache = cache_over(&store);

    let a = cache.get("stock-api", "alpha", None).await.unwrap();
    let b = cache.get("stock-api", "beta", None).await.unwrap();
    let a2 = cache.get("stock-api", "alpha", Some("2")).await.unwrap();
    let other_ns = cache.get("other", "alpha", None).await.unwrap();

    assert_eq!(store.calls(), 4);
    assert_eq!(cache.len(), 4);
    assert_ne!(a.expose(), b.expose());
    assert_eq!(a2.expose(), "alpha-2-v3");
    assert_eq!(other_ns.expose(), "alpha-latest-v4");
}

#[tokio::test]
async fn default_and_explicit_latest_share_an_entry() {
    let store = GatedStore::open();
    let cache = cache_over(&store);

    cache.get("stock-api", "alpha", None).await.unwrap();
    cache.get("stock-api", "alpha", Some("latest")).await.unwrap();
    cache.get("stock-api", "alpha", Some("")).await.unwrap();

    assert_eq!(store.calls(), 1);
    assert!(
        cache
            .entry(&CacheKey::latest("stock-api", "alpha"))
            .is_some()
    );
}

#[tokio::test]
async fn clear_forces_reload() {
    let store = GatedStore::open();
    let cache = cache_over(&store);

    let before = cache.get("stock-api", "alpha", None).await.unwrap();
    assert_eq!(cache.clear(), 1);
    assert!(cache.is_empty());

    let after = cache.get("stock-api", "alpha", None).await.unwrap();
    assert_eq!(store.calls(), 2);
    assert_eq!(before.expose(), "alpha-latest-v1");
    assert_eq!(after.expose(), "alpha-latest-v2");
}

#[tokio::test]
async fn clear_during_load_does_not_retain_value() {
    let store = GatedStore::closed();
    let cache = cache_over(&store);

    let waiter = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.get("stock-api", "alpha", None).await })
    };

    wait_for_calls(&store, 1).await;
    assert_eq!(cache.clear(), 0);
    store.release(1);

    let value = waiter.await.unwrap().unwrap();
    assert_eq!(value.expose(), "alpha-latest-v1");
    assert!(cache.is_empty());

    store.release(1);
    cache.get("stock-api", "alpha", None).await.unwrap();
    assert_eq!(store.calls(), 2);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn lookup_after_clear_during_load_starts_fresh_load() {
    let store = GatedStore::closed();
    let cache = cache_over(&store);

    let stale = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.get("stock-api", "alpha", None).await })
    };
    wait_for_calls(&store, 1).await;
    cache.clear();

    let fresh = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.get("stock-api", "alpha", None).await })
    };
    wait_for_calls(&store, 2).await;

    store.release(2);
    stale.await.unwrap().unwrap();
    fresh.await.unwrap().unwrap();

    // Only the load started after the clear populates the cache.
    let entry = cache
        .entry(&CacheKey::latest("stock-api", "alpha"))
        .unwrap();
    assert_eq!(store.calls(), 2);
    assert_eq!(cache.len(), 1);
    assert!(entry.value.expose().starts_with("alpha-latest-v"));
}
