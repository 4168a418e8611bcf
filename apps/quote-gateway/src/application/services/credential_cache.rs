//! Credential Cache
//!
//! Get-or-load cache in front of the secret store.
//!
//! # Guarantees
//!
//! - At most one entry per [`CacheKey`].
//! - Single-flight loads: callers racing on a missing key share one store
//!   call and all observe its outcome, success or failure.
//! - Failures are never cached; the next `get` starts a new load.
//! - [`CredentialCache::clear`] drops every entry at once. A load that was in
//!   flight when the cache was cleared still answers its waiters but its value
//!   is not inserted.
//!
//! There is no TTL or size bound. Staleness is bounded by the eviction timer
//! that calls `clear` on a schedule.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;

use crate::application::ports::SecretStorePort;
use crate::domain::credentials::{CacheEntry, CacheKey, SecretValue};
use crate::infrastructure::metrics;

// =============================================================================
// Errors
// =============================================================================

/// Credential resolution failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CredentialError {
    /// The secret store load failed. The store error's kind and message are
    /// carried over.
    #[error("credential unavailable for {key} ({kind}): {message}")]
    Unavailable {
        /// Composite key that failed to load.
        key: String,
        /// Store failure kind.
        kind: &'static str,
        /// Store failure message.
        message: String,
    },
}

impl CredentialError {
    /// Store failure kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable { kind, .. } => kind,
        }
    }
}

// =============================================================================
// Cache Slots
// =============================================================================

type LoadResult = Result<SecretValue, CredentialError>;
type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

enum Slot {
    Ready(CacheEntry),
    Loading { load_id: u64, load: SharedLoad },
}

type Slots = Arc<Mutex<HashMap<CacheKey, Slot>>>;

// =============================================================================
// Credential Cache
// =============================================================================

/// Process-wide secret cache with single-flight loading.
///
/// Share it by `Arc` between the request authenticators and the eviction
/// timer.
pub struct CredentialCache {
    store: Arc<dyn SecretStorePort>,
    slots: Slots,
    next_load_id: AtomicU64,
}

impl CredentialCache {
    /// Create an empty cache backed by `store`.
    #[must_use]
    pub fn new(store: Arc<dyn SecretStorePort>) -> Self {
        Self {
            store,
            slots: Arc::new(Mutex::new(HashMap::new())),
            next_load_id: AtomicU64::new(0),
        }
    }

    /// Resolve a secret, loading it from the store on a miss.
    ///
    /// `version` defaults to `latest`.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Unavailable` if the store load fails.
    pub async fn get(
        &self,
        namespace: &str,
        secret_id: &str,
        version: Option<&str>,
    ) -> Result<SecretValue, CredentialError> {
        self.get_key(CacheKey::new(namespace, secret_id, version))
            .await
    }

    /// Resolve a secret by its composite key.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Unavailable` if the store load fails.
    pub async fn get_key(&self, key: CacheKey) -> Result<SecretValue, CredentialError> {
        let load = {
            let mut slots = self.slots.lock();
            match slots.get(&key) {
                Some(Slot::Ready(entry)) => {
                    metrics::record_cache_hit();
                    return Ok(entry.value.clone());
                }
                Some(Slot::Loading { load, .. }) => {
                    tracing::debug!(key = %key, "Joining in-flight credential load");
                    metrics::record_cache_join();
                    load.clone()
                }
                None => {
                    metrics::record_cache_miss();
                    let load_id = self.next_load_id.fetch_add(1, Ordering::Relaxed);
                    let load = self.start_load(key.clone(), load_id);
                    slots.insert(
                        key,
                        Slot::Loading {
                            load_id,
                            load: load.clone(),
                        },
                    );
                    load
                }
            }
        };

        load.await
    }

    /// Drop every entry. Returns how many loaded entries were evicted.
    pub fn clear(&self) -> usize {
        let evicted = {
            let mut slots = self.slots.lock();
            let evicted = slots
                .values()
                .filter(|slot| matches!(slot, Slot::Ready(_)))
                .count();
            slots.clear();
            evicted
        };

        metrics::record_cache_eviction(evicted);
        metrics::set_cache_entries(0);
        evicted
    }

    /// Number of loaded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    /// Whether no entry is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The loaded entry for `key`, if any.
    #[must_use]
    pub fn entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.slots.lock().get(key) {
            Some(Slot::Ready(entry)) => Some(entry.clone()),
            _ => None,
        }
    }

    /// Build the shared load future for `key`.
    ///
    /// The future settles its own slot: on success it replaces the loading
    /// slot with a ready entry, on failure it removes it. Either step is
    /// skipped if the slot no longer belongs to this load.
    fn start_load(&self, key: CacheKey, load_id: u64) -> SharedLoad {
        let store = Arc::clone(&self.store);
        let slots = Arc::clone(&self.slots);

        async move {
            tracing::info!(
                namespace = key.namespace(),
                secret_id = key.secret_id(),
                version = key.version(),
                "Credential cache miss, loading from secret store"
            );

            let result = store.fetch(&key).await;

            let mut slots = slots.lock();
            let owns_slot = matches!(
                slots.get(&key),
                Some(Slot::Loading { load_id: current, .. }) if *current == load_id
            );

            match result {
                Ok(value) => {
                    metrics::record_cache_load("success");
                    if owns_slot {
                        let entry = CacheEntry::new(key.clone(), value.clone());
                        slots.insert(key, Slot::Ready(entry));
                    } else {
                        tracing::debug!(
                            key = %key,
                            "Cache cleared during load, value not retained"
                        );
                    }
                    let entries = slots
                        .values()
                        .filter(|slot| matches!(slot, Slot::Ready(_)))
                        .count();
                    metrics::set_cache_entries(entries);
                    Ok(value)
                }
                Err(e) => {
                    metrics::record_cache_load("failure");
                    if owns_slot {
                        slots.remove(&key);
                    }
                    tracing::error!(
                        key = %key,
                        kind = e.kind(),
                        error = %e,
                        "Failed to load credential from secret store"
                    );
                    Err(CredentialError::Unavailable {
                        key: key.to_string(),
                        kind: e.kind(),
                        message: e.to_string(),
                    })
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl std::fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCache")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockSecretStorePort, SecretStoreError};

    fn cache_with(store: MockSecretStorePort) -> CredentialCache {
        CredentialCache::new(Arc::new(store))
    }

    #[tokio::test]
    async fn hit_after_first_load() {
        let mut store = MockSecretStorePort::new();
        store
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(SecretValue::new("token-1")));
        let cache = cache_with(store);

        let first = cache.get("proj", "token", None).await.unwrap();
        let second = cache.get("proj", "token", None).await.unwrap();

        assert_eq!(first.expose(), "token-1");
        assert_eq!(second.expose(), "token-1");
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn failure_is_folded_into_credential_error() {
        let mut store = MockSecretStorePort::new();
        store.expect_fetch().times(1).returning(|_| {
            Err(SecretStoreError::PermissionDenied {
                message: "billing disabled".to_string(),
            })
        });
        let cache = cache_with(store);

        let err = cache.get("proj", "token", Some("2")).await.unwrap_err();

        assert_eq!(err.kind(), "permission_denied");
        let text = err.to_string();
        assert!(text.contains("proj:token:2"));
        assert!(text.contains("billing disabled"));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn entry_records_key_and_value() {
        let mut store = MockSecretStorePort::new();
        store
            .expect_fetch()
            .returning(|key| Ok(SecretValue::new(format!("value-for-{}", key.secret_id()))));
        let cache = cache_with(store);

        cache.get("proj", "alpha", None).await.unwrap();

        let entry = cache.entry(&CacheKey::latest("proj", "alpha")).unwrap();
        assert_eq!(entry.key.to_string(), "proj:alpha:latest");
        assert_eq!(entry.value.expose(), "value-for-alpha");
        assert!(cache.entry(&CacheKey::latest("proj", "beta")).is_none());
    }

    #[tokio::test]
    async fn clear_reports_evicted_count() {
        let mut store = MockSecretStorePort::new();
        store
            .expect_fetch()
            .returning(|_| Ok(SecretValue::new("v")));
        let cache = cache_with(store);

        cache.get("p1", "s1", None).await.unwrap();
        cache.get("p2", "s2", None).await.unwrap();

        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.clear(), 0);
    }
}
