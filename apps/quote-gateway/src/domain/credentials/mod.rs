//! Credential Types
//!
//! Domain types for identifying secrets in the remote secret store and for
//! holding their values once loaded.
//!
//! # Key Composition
//!
//! A secret is addressed by `(namespace, secret_id, version)`. When no version
//! is given the literal [`LATEST_VERSION`] is used, so a lookup without a
//! version and a lookup for `"latest"` resolve to the same [`CacheKey`].

use std::fmt;

use chrono::{DateTime, Utc};

/// Version marker used when a caller does not pin a secret version.
pub const LATEST_VERSION: &str = "latest";

// =============================================================================
// Cache Key
// =============================================================================

/// Composite identity of a cached secret.
///
/// Immutable once constructed. Displays as `namespace:secret_id:version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: String,
    secret_id: String,
    version: String,
}

impl CacheKey {
    /// Create a key, defaulting the version to [`LATEST_VERSION`].
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        secret_id: impl Into<String>,
        version: Option<&str>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            secret_id: secret_id.into(),
            version: version
                .filter(|v| !v.is_empty())
                .unwrap_or(LATEST_VERSION)
                .to_string(),
        }
    }

    /// Create a key for the latest version of a secret.
    #[must_use]
    pub fn latest(namespace: impl Into<String>, secret_id: impl Into<String>) -> Self {
        Self::new(namespace, secret_id, None)
    }

    /// Namespace (for GCP, the project ID).
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Secret identifier within the namespace.
    #[must_use]
    pub fn secret_id(&self) -> &str {
        &self.secret_id
    }

    /// Effective version, never empty.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.secret_id, self.version)
    }
}

// =============================================================================
// Secret Reference
// =============================================================================

/// Configured reference to a provider credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    /// Namespace (GCP project ID).
    pub namespace: String,
    /// Secret identifier.
    pub secret_id: String,
    /// Pinned version, or `None` for the latest.
    pub version: Option<String>,
}

impl SecretRef {
    /// Reference the latest version of a secret.
    #[must_use]
    pub fn latest(namespace: impl Into<String>, secret_id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            secret_id: secret_id.into(),
            version: None,
        }
    }

    /// The cache key this reference resolves to.
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.namespace, &self.secret_id, self.version.as_deref())
    }
}

// =============================================================================
// Secret Value
// =============================================================================

/// An opaque secret payload.
///
/// The `Debug` implementation redacts the value so it can sit inside logged
/// structs without leaking.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    /// Wrap a raw secret string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw secret. Callers must not log the result.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue([REDACTED])")
    }
}

// =============================================================================
// Cache Entry
// =============================================================================

/// A successfully loaded secret held by the credential cache.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Key the value was loaded for.
    pub key: CacheKey,
    /// Loaded secret value.
    pub value: SecretValue,
    /// When the load completed.
    pub inserted_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    #[must_use]
    pub fn new(key: CacheKey, value: SecretValue) -> Self {
        Self {
            key,
            value,
            inserted_at: Utc::now(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
