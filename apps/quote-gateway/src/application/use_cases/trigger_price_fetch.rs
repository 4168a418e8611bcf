//! Trigger Price Fetch Use Case
//!
//! Manual counterpart of the cron scheduler. Always yields a response
//! object; channel declines and dispatch errors become `ERROR` bodies.

use std::sync::Arc;

use chrono_tz::Tz;

use crate::application::dto::PriceFetchTriggerResponse;
use crate::application::ports::TriggerChannelPort;
use crate::domain::trigger::{TriggerEvent, TriggerSource};
use crate::infrastructure::metrics;

const CHANNEL_DECLINED_REASON: &str = "Unable to send message to channel";

/// Use case for on-demand price fetches.
pub struct TriggerPriceFetchUseCase {
    channel: Arc<dyn TriggerChannelPort>,
    zone: Tz,
}

impl TriggerPriceFetchUseCase {
    /// Create a new `TriggerPriceFetchUseCase` stamping events in `zone`.
    #[must_use]
    pub fn new(channel: Arc<dyn TriggerChannelPort>, zone: Tz) -> Self {
        Self { channel, zone }
    }

    /// Issue a trigger for "now" and wait for the dispatcher to handle it.
    pub async fn execute(&self) -> PriceFetchTriggerResponse {
        let event = TriggerEvent::now_in(self.zone);
        let triggered_at = event.requested_at();

        tracing::info!(triggered_at = %triggered_at, "Manual price fetch requested");

        match self.channel.send(event).await {
            Ok(true) => {
                metrics::record_trigger(TriggerSource::Manual, "success");
                PriceFetchTriggerResponse::success(triggered_at)
            }
            Ok(false) => {
                tracing::warn!(
                    triggered_at = %triggered_at,
                    "Trigger channel declined manual event"
                );
                metrics::record_trigger(TriggerSource::Manual, "declined");
                PriceFetchTriggerResponse::failure(CHANNEL_DECLINED_REASON, triggered_at)
            }
            Err(e) => {
                tracing::error!(
                    triggered_at = %triggered_at,
                    error = %e,
                    "Manual price fetch dispatch failed"
                );
                metrics::record_trigger(TriggerSource::Manual, "error");
                PriceFetchTriggerResponse::failure(&e.to_string(), triggered_at)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::TriggerStatus;
    use crate::application::ports::DispatchError;
    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;

    // Mock channel
    struct MockChannel {
        outcome: Result<bool, DispatchError>,
        received: Mutex<Vec<TriggerEvent>>,
    }

    impl MockChannel {
        fn new(outcome: Result<bool, DispatchError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                received: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TriggerChannelPort for MockChannel {
        async fn send(&self, event: TriggerEvent) -> Result<bool, DispatchError> {
            self.received.lock().push(event);
            self.outcome.clone()
        }
    }

    fn use_case(channel: Arc<MockChannel>) -> TriggerPriceFetchUseCase {
        TriggerPriceFetchUseCase::new(channel, chrono_tz::America::New_York)
    }

    #[tokio::test]
    async fn accepted_trigger_reports_success() {
        let channel = MockChannel::new(Ok(true));
        let before = Utc::now();

        let response = use_case(Arc::clone(&channel)).execute().await;

        assert_eq!(response.status, TriggerStatus::Success);
        assert_eq!(response.message, "Price fetch triggered successfully");
        assert_eq!(response.triggered_at.timezone(), chrono_tz::America::New_York);
        let issued = response.triggered_at.with_timezone(&Utc);
        assert!((issued - before).num_seconds().abs() <= 1);

        let received = channel.received.lock();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].requested_at(), response.triggered_at);
    }

    #[tokio::test]
    async fn declined_trigger_reports_channel_error() {
        let channel = MockChannel::new(Ok(false));

        let response = use_case(channel).execute().await;

        assert_eq!(response.status, TriggerStatus::Error);
        assert_eq!(
            response.message,
            "Price fetch failed: Unable to send message to channel"
        );
    }

    #[tokio::test]
    async fn dispatch_error_message_is_carried() {
        let channel = MockChannel::new(Err(DispatchError::Transport {
            message: "boom".to_string(),
        }));

        let response = use_case(channel).execute().await;

        assert_eq!(response.status, TriggerStatus::Error);
        assert_eq!(response.message, "Price fetch failed: boom");
    }
}
