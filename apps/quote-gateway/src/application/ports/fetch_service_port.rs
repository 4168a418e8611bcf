//! Fetch Service Port (Driven Port)
//!
//! Interface for the price-fetching work run once per trigger.

use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;

/// Price fetch failure.
#[derive(Debug, Clone, thiserror::Error)]
#[error("price fetch failed: {message}")]
pub struct FetchError {
    /// Failure detail.
    pub message: String,
}

impl FetchError {
    /// Create a fetch error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Port for running one price-fetch cycle.
#[async_trait]
pub trait FetchServicePort: Send + Sync {
    /// Fetch prices for a trigger raised at `trigger_time`.
    async fn fetch_prices(&self, trigger_time: DateTime<Tz>) -> Result<(), FetchError>;
}

/// Stand-in fetch service that only logs the cycle.
#[derive(Debug, Clone, Default)]
pub struct NoOpFetchService;

#[async_trait]
impl FetchServicePort for NoOpFetchService {
    async fn fetch_prices(&self, trigger_time: DateTime<Tz>) -> Result<(), FetchError> {
        tracing::info!(trigger_time = %trigger_time, "Starting price fetch");
        // TODO: fetch the watched symbols through the quote providers once
        // symbol storage exists.
        tracing::info!(trigger_time = %trigger_time, "Price fetch completed");
        Ok(())
    }
}
