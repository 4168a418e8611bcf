//! Credential Cache Eviction Timer
//!
//! Wipes the whole credential cache on a cron schedule evaluated in the
//! host's local zone. This is the only staleness bound on cached secrets.

use std::sync::Arc;

use chrono::Local;
use tokio_util::sync::CancellationToken;

use super::cron::{CronSchedule, run_schedule};
use crate::application::services::CredentialCache;

/// Periodic full clear of the credential cache.
pub struct CacheEvictionTimer {
    cache: Arc<CredentialCache>,
    schedule: CronSchedule<Local>,
}

impl CacheEvictionTimer {
    /// Create a timer clearing `cache` at every occurrence of `schedule`.
    #[must_use]
    pub const fn new(cache: Arc<CredentialCache>, schedule: CronSchedule<Local>) -> Self {
        Self { cache, schedule }
    }

    /// Clear the cache now. Returns the number of entries dropped.
    pub fn evict(&self) -> usize {
        let evicted = self.cache.clear();
        tracing::info!(evicted, "Evicted all credential cache entries");
        evicted
    }

    /// Run until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        let schedule = self.schedule.clone();
        run_schedule("credential-cache-eviction", schedule, shutdown, |_| {
            self.evict();
            async {}
        })
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockSecretStorePort;
    use crate::domain::credentials::SecretValue;

    #[tokio::test]
    async fn evict_empties_cache() {
        let mut store = MockSecretStorePort::new();
        store
            .expect_fetch()
            .times(2)
            .returning(|_| Ok(SecretValue::new("v")));
        let cache = Arc::new(CredentialCache::new(Arc::new(store)));
        let timer = CacheEvictionTimer::new(
            Arc::clone(&cache),
            CronSchedule::parse("0 0 2,14 * * *", Local).unwrap(),
        );

        cache.get("proj", "a", None).await.unwrap();
        cache.get("proj", "b", Some("3")).await.unwrap();

        assert_eq!(timer.evict(), 2);
        assert!(cache.is_empty());
    }
}
