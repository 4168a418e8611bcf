//! Environment Secret Store
//!
//! Development backend that reads secrets from environment variables.
//! Not for production: values are visible to anything that can read the
//! process environment.
//!
//! A key `namespace:secret_id:version` is looked up as
//! `SECRET_<NAMESPACE>_<SECRET_ID>_<VERSION>`. For `latest` the unversioned
//! `SECRET_<NAMESPACE>_<SECRET_ID>` is tried as well. Names are upper-cased
//! and every non-alphanumeric character becomes `_`.
//!
//! ```bash
//! export SECRET_STOCK_API_STOCKDATA_API_TOKEN="my-token"
//! ```

use async_trait::async_trait;

use crate::application::ports::{SecretStoreError, SecretStorePort};
use crate::domain::credentials::{CacheKey, LATEST_VERSION, SecretValue};
use crate::infrastructure::metrics;

const SECRET_PREFIX: &str = "SECRET_";

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Environment variable secret store (development only).
pub struct EnvSecretStore {
    lookup: Lookup,
}

impl EnvSecretStore {
    /// Read from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::with_lookup(|name| std::env::var(name).ok())
    }

    /// Read through a custom lookup function.
    #[must_use]
    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }

    /// Variable names tried for `key`, most specific first.
    #[must_use]
    pub fn variable_names(key: &CacheKey) -> Vec<String> {
        let base = format!(
            "{SECRET_PREFIX}{}_{}",
            sanitize(key.namespace()),
            sanitize(key.secret_id())
        );
        let versioned = format!("{base}_{}", sanitize(key.version()));

        if key.version() == LATEST_VERSION {
            vec![versioned, base]
        } else {
            vec![versioned]
        }
    }
}

impl std::fmt::Debug for EnvSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvSecretStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl SecretStorePort for EnvSecretStore {
    async fn fetch(&self, key: &CacheKey) -> Result<SecretValue, SecretStoreError> {
        let found = Self::variable_names(key)
            .into_iter()
            .find_map(|name| (self.lookup)(&name).filter(|v| !v.is_empty()));

        if let Some(value) = found {
            metrics::record_secret_store_call("env", "ok");
            return Ok(SecretValue::new(value));
        }

        tracing::debug!(
            key = %key,
            candidates = ?Self::variable_names(key),
            "Secret not found in environment"
        );
        metrics::record_secret_store_call("env", "not_found");
        Err(SecretStoreError::NotFound {
            key: key.to_string(),
        })
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
