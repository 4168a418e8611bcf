//! Quote Provider Adapters
//!
//! Outbound clients for third-party quote APIs. Every request passes through
//! a [`RequestAuthenticator`] that injects the provider credential.

mod alpha_vantage;
mod authenticator;
mod http_client;
mod stock_data;

pub use alpha_vantage::{AlphaVantageClient, DEFAULT_ALPHA_VANTAGE_SYMBOLS};
pub use authenticator::RequestAuthenticator;
pub use http_client::{QuoteHttpClient, build_http_client};
pub use stock_data::{DEFAULT_STOCK_DATA_SYMBOLS, StockDataClient};
