//! GCP Secret Manager Store
//!
//! REST client for `projects/{ns}/secrets/{id}/versions/{v}:access`.
//!
//! ## Authentication
//!
//! A static bearer token (`GCP_ACCESS_TOKEN`) is used when configured.
//! Otherwise a token is requested from the GCE metadata server and reused
//! until shortly before it expires.
//!
//! ## Failure Mapping
//!
//! | HTTP status | Error |
//! |---|---|
//! | 401 | `Unauthenticated` |
//! | 403 | `PermissionDenied` |
//! | 404 | `NotFound` |
//! | other non-2xx | `Backend` |
//!
//! Every call, token acquisition included, is bounded by the configured
//! timeout.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::Mutex;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::application::ports::{SecretStoreError, SecretStorePort};
use crate::domain::credentials::{CacheKey, SecretValue};
use crate::infrastructure::metrics;

/// Default Secret Manager endpoint.
pub const DEFAULT_SECRET_MANAGER_URL: &str = "https://secretmanager.googleapis.com";

/// Default metadata server token endpoint.
pub const DEFAULT_METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Refresh metadata tokens this long before they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

// =============================================================================
// Token Source
// =============================================================================

/// Where bearer tokens for Secret Manager come from.
#[derive(Clone)]
pub enum AccessTokenSource {
    /// Fixed token supplied by configuration.
    Static(String),
    /// GCE metadata server token endpoint.
    Metadata(Url),
}

impl std::fmt::Debug for AccessTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(_) => f.write_str("Static([REDACTED])"),
            Self::Metadata(url) => f.debug_tuple("Metadata").field(&url.as_str()).finish(),
        }
    }
}

struct CachedToken {
    token: String,
    refresh_at: Instant,
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Deserialize)]
struct SecretPayload {
    data: String,
}

#[derive(Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Deserialize)]
struct GoogleError {
    message: String,
}

// =============================================================================
// Store
// =============================================================================

/// Secret store backed by GCP Secret Manager.
pub struct GcpSecretManagerStore {
    http: reqwest::Client,
    base_url: Url,
    tokens: AccessTokenSource,
    cached_token: Mutex<Option<CachedToken>>,
    timeout: Duration,
}

impl GcpSecretManagerStore {
    /// Create a store against `base_url`.
    #[must_use]
    pub const fn new(
        http: reqwest::Client,
        base_url: Url,
        tokens: AccessTokenSource,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            base_url,
            tokens,
            cached_token: Mutex::new(None),
            timeout,
        }
    }

    /// Resource URL for one secret version.
    fn version_url(&self, key: &CacheKey) -> Result<Url, SecretStoreError> {
        let version = format!("{}:access", key.version());
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| SecretStoreError::Transport {
                message: format!("secret manager URL cannot be a base: {}", self.base_url),
            })?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                key.namespace(),
                "secrets",
                key.secret_id(),
                "versions",
                version.as_str(),
            ]);
        Ok(url)
    }

    async fn access_token(&self) -> Result<String, SecretStoreError> {
        let url = match &self.tokens {
            AccessTokenSource::Static(token) => return Ok(token.clone()),
            AccessTokenSource::Metadata(url) => url,
        };

        let cached = self
            .cached_token
            .lock()
            .as_ref()
            .filter(|cached| Instant::now() < cached.refresh_at)
            .map(|cached| cached.token.clone());
        if let Some(token) = cached {
            return Ok(token);
        }

        tracing::debug!("Requesting access token from metadata server");

        let response = self
            .http
            .get(url.clone())
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| SecretStoreError::Unauthenticated {
                message: format!("no GCP_ACCESS_TOKEN set and metadata server unreachable: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(SecretStoreError::Unauthenticated {
                message: format!("metadata server returned {}", response.status()),
            });
        }

        let token: MetadataToken =
            response
                .json()
                .await
                .map_err(|e| SecretStoreError::Unauthenticated {
                    message: format!("invalid metadata token response: {e}"),
                })?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        *self.cached_token.lock() = Some(CachedToken {
            token: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }

    async fn access(&self, key: &CacheKey) -> Result<SecretValue, SecretStoreError> {
        let token = self.access_token().await?;
        let url = self.version_url(key)?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SecretStoreError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, key, &body));
        }

        let body: AccessSecretVersionResponse =
            response
                .json()
                .await
                .map_err(|e| SecretStoreError::InvalidPayload {
                    message: e.to_string(),
                })?;

        decode_payload(&body.payload.data)
    }
}

#[async_trait]
impl SecretStorePort for GcpSecretManagerStore {
    async fn fetch(&self, key: &CacheKey) -> Result<SecretValue, SecretStoreError> {
        let result = match tokio::time::timeout(self.timeout, self.access(key)).await {
            Ok(result) => result,
            Err(_) => Err(SecretStoreError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }),
        };

        metrics::record_secret_store_call(
            "gcp",
            result.as_ref().map_or_else(SecretStoreError::kind, |_| "ok"),
        );
        result
    }
}

impl std::fmt::Debug for GcpSecretManagerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpSecretManagerStore")
            .field("base_url", &self.base_url.as_str())
            .field("tokens", &self.tokens)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn map_status(status: StatusCode, key: &CacheKey, body: &str) -> SecretStoreError {
    let message = serde_json::from_str::<GoogleErrorBody>(body)
        .map_or_else(|_| body.to_string(), |b| b.error.message);

    match status {
        StatusCode::NOT_FOUND => SecretStoreError::NotFound {
            key: key.to_string(),
        },
        StatusCode::FORBIDDEN => SecretStoreError::PermissionDenied { message },
        StatusCode::UNAUTHORIZED => SecretStoreError::Unauthenticated { message },
        other => SecretStoreError::Backend {
            status: other.as_u16(),
            message,
        },
    }
}

fn decode_payload(data: &str) -> Result<SecretValue, SecretStoreError> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| SecretStoreError::InvalidPayload {
            message: format!("payload is not base64: {e}"),
        })?;

    String::from_utf8(bytes)
        .map(SecretValue::new)
        .map_err(|_| SecretStoreError::InvalidPayload {
            message: "payload is not UTF-8".to_string(),
        })
}

// =============================================================================
// Tests
// =============================================================================
