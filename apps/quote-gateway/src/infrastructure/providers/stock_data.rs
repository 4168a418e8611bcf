//! StockData.org Client
//!
//! `GET data/quote?symbols=…&key_by_ticker=true`, authenticated with
//! `api_token`.

use async_trait::async_trait;

use super::http_client::QuoteHttpClient;
use crate::application::ports::{ProviderError, QuoteProvider, QuoteProviderPort};

/// Symbols requested when the caller gives none.
pub const DEFAULT_STOCK_DATA_SYMBOLS: &str = "NVDA,MSFT,AAPL";

/// StockData.org quote provider.
#[derive(Debug, Clone)]
pub struct StockDataClient {
    http: QuoteHttpClient,
}

impl StockDataClient {
    /// Wrap an authenticated HTTP client.
    #[must_use]
    pub const fn new(http: QuoteHttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl QuoteProviderPort for StockDataClient {
    fn provider(&self) -> QuoteProvider {
        QuoteProvider::StockData
    }

    async fn fetch_quotes(&self, symbols: &str) -> Result<serde_json::Value, ProviderError> {
        self.http
            .get_json(
                "data/quote",
                &[("symbols", symbols), ("key_by_ticker", "true")],
            )
            .await
    }
}
