//! Alpha Vantage Client
//!
//! Realtime bulk quotes: `GET query?function=REALTIME_BULK_QUOTES&symbol=…`,
//! authenticated with `apikey`.

use async_trait::async_trait;

use super::http_client::QuoteHttpClient;
use crate::application::ports::{ProviderError, QuoteProvider, QuoteProviderPort};

/// Symbols requested when the caller gives none.
pub const DEFAULT_ALPHA_VANTAGE_SYMBOLS: &str = "GRID,MSFT,AAPL,IBM";

/// Alpha Vantage quote provider.
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    http: QuoteHttpClient,
}

impl AlphaVantageClient {
    /// Wrap an authenticated HTTP client.
    #[must_use]
    pub const fn new(http: QuoteHttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl QuoteProviderPort for AlphaVantageClient {
    fn provider(&self) -> QuoteProvider {
        QuoteProvider::AlphaVantage
    }

    async fn fetch_quotes(&self, symbols: &str) -> Result<serde_json::Value, ProviderError> {
        self.http
            .get_json(
                "query",
                &[("function", "REALTIME_BULK_QUOTES"), ("symbol", symbols)],
            )
            .await
    }
}
