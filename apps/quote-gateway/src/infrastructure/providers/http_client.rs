//! Authenticated Quote HTTP Client
//!
//! Shared request pipeline for the provider clients:
//! build URL → authenticate → send → check status → decode JSON.
//!
//! Request URLs carry the credential, so only the path is ever logged.

use std::time::{Duration, Instant};

use reqwest::Url;

use super::authenticator::RequestAuthenticator;
use crate::application::ports::{ProviderError, QuoteProvider};
use crate::infrastructure::metrics;

/// Build the `reqwest` client used for upstream calls.
///
/// # Errors
///
/// Returns `reqwest::Error` if the TLS backend cannot be initialised.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("quote-gateway/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// One provider's base URL plus its authenticator.
#[derive(Debug, Clone)]
pub struct QuoteHttpClient {
    provider: QuoteProvider,
    http: reqwest::Client,
    base_url: Url,
    authenticator: RequestAuthenticator,
}

impl QuoteHttpClient {
    /// Create a client for `provider` rooted at `base_url`.
    #[must_use]
    pub const fn new(
        provider: QuoteProvider,
        http: reqwest::Client,
        base_url: Url,
        authenticator: RequestAuthenticator,
    ) -> Self {
        Self {
            provider,
            http,
            base_url,
            authenticator,
        }
    }

    /// Which provider this client talks to.
    #[must_use]
    pub const fn provider(&self) -> QuoteProvider {
        self.provider
    }

    /// Authenticator used for every request.
    #[must_use]
    pub const fn authenticator(&self) -> &RequestAuthenticator {
        &self.authenticator
    }

    /// GET `path` relative to the base URL with `query`, returning the JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::RequestConstruction` if the credential cannot
    /// be resolved (nothing is sent), or a transport, status or decode error.
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, ProviderError> {
        let started = Instant::now();
        let result = self.execute(path, query).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        metrics::record_provider_request(self.provider, outcome, started.elapsed());

        match &result {
            Ok(_) => tracing::debug!(
                provider = self.provider.as_str(),
                path,
                elapsed_ms = started.elapsed().as_millis(),
                "Upstream request succeeded"
            ),
            Err(e) => tracing::warn!(
                provider = self.provider.as_str(),
                path,
                kind = e.kind(),
                error = %e,
                "Upstream request failed"
            ),
        }

        result
    }

    async fn execute(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, ProviderError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ProviderError::InvalidRequest {
                message: format!("cannot join '{path}' onto {}: {e}", self.base_url),
            })?;

        let request = self
            .http
            .get(url)
            .query(query)
            .build()
            .map_err(|e| ProviderError::InvalidRequest {
                message: e.to_string(),
            })?;

        let request = self.authenticator.authenticate(request).await?;

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| ProviderError::Transport {
                message: e.without_url().to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport {
                message: e.without_url().to_string(),
            })?;

        if !status.is_success() {
            return Err(ProviderError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::Decode {
            message: e.to_string(),
        })
    }
}
