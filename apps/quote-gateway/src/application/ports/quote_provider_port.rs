//! Quote Provider Port (Driven Port)
//!
//! Interface for third-party quote providers. Response bodies are passed
//! through as opaque JSON.

use async_trait::async_trait;

use crate::application::services::CredentialError;

/// Known upstream providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteProvider {
    /// Alpha Vantage (`apikey` query parameter).
    AlphaVantage,
    /// StockData.org (`api_token` query parameter).
    StockData,
}

impl QuoteProvider {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlphaVantage => "alphavantage",
            Self::StockData => "stockdata",
        }
    }
}

/// Outbound provider call failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// The request could not be built; nothing was sent.
    #[error("request construction failed: {0}")]
    RequestConstruction(#[from] CredentialError),

    /// Request URL could not be formed from the configured base.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Detail.
        message: String,
    },

    /// The request was sent but the transport failed.
    #[error("transport error: {message}")]
    Transport {
        /// Underlying error text.
        message: String,
    },

    /// Upstream answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    UpstreamStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, as received.
        body: String,
    },

    /// Upstream body was not JSON.
    #[error("invalid upstream response: {message}")]
    Decode {
        /// Parse failure detail.
        message: String,
    },
}

impl ProviderError {
    /// Stable failure label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RequestConstruction(_) => "credential_unavailable",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Transport { .. } => "transport",
            Self::UpstreamStatus { .. } => "upstream_status",
            Self::Decode { .. } => "decode",
        }
    }
}

/// Port for fetching quotes from one provider.
#[async_trait]
pub trait QuoteProviderPort: Send + Sync {
    /// Which provider this is.
    fn provider(&self) -> QuoteProvider;

    /// Fetch quotes for a comma-separated symbol list.
    async fn fetch_quotes(&self, symbols: &str) -> Result<serde_json::Value, ProviderError>;
}
