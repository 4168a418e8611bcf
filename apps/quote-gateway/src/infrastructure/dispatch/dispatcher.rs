//! Trigger Dispatcher
//!
//! The single consumer of the trigger channel. Runs one price fetch per
//! event, in arrival order, and reports the outcome to the producer.
//!
//! A fetch failure is logged and returned to the producer as
//! `DispatchError::Handler`. It is never retried and never stops the loop.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use super::channel::TriggerReceiver;
use crate::application::ports::{DispatchError, FetchServicePort};
use crate::domain::trigger::TriggerEvent;
use crate::infrastructure::metrics;

/// Consumer that hands each trigger to the fetch service.
pub struct TriggerDispatcher {
    fetch_service: Arc<dyn FetchServicePort>,
}

impl TriggerDispatcher {
    /// Create a dispatcher running `fetch_service` per event.
    #[must_use]
    pub fn new(fetch_service: Arc<dyn FetchServicePort>) -> Self {
        Self { fetch_service }
    }

    /// Handle one event.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Handler` if the fetch service fails.
    pub async fn handle(&self, event: TriggerEvent) -> Result<(), DispatchError> {
        let trigger_time = event.requested_at();
        let started = Instant::now();

        tracing::info!(trigger_time = %trigger_time, "Received price fetch trigger");

        match self.fetch_service.fetch_prices(trigger_time).await {
            Ok(()) => {
                metrics::record_fetch_duration("success", started.elapsed());
                tracing::info!(
                    trigger_time = %trigger_time,
                    elapsed_ms = started.elapsed().as_millis(),
                    "Price fetch cycle finished"
                );
                Ok(())
            }
            Err(e) => {
                metrics::record_fetch_duration("failure", started.elapsed());
                tracing::error!(
                    trigger_time = %trigger_time,
                    error = %e,
                    "Price fetch cycle failed"
                );
                Err(e.into())
            }
        }
    }

    /// Consume `receiver` until `shutdown` is cancelled or every sender is
    /// dropped.
    pub async fn run(self, mut receiver: TriggerReceiver, shutdown: CancellationToken) {
        tracing::info!("Trigger dispatcher started");

        loop {
            let delivery = tokio::select! {
                () = shutdown.cancelled() => break,
                delivery = receiver.recv() => delivery,
            };

            let Some(delivery) = delivery else {
                break;
            };

            let outcome = self.handle(delivery.event()).await;
            delivery.complete(outcome);
        }

        tracing::info!("Trigger dispatcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{FetchError, TriggerChannelPort};
    use crate::infrastructure::dispatch::trigger_channel;
    use async_trait::async_trait;
    use chrono::DateTime;
    use chrono_tz::Tz;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Mock fetch service
    #[derive(Default)]
    struct CountingFetch {
        calls: AtomicUsize,
        should_fail: bool,
    }

    #[async_trait]
    impl FetchServicePort for CountingFetch {
        async fn fetch_prices(&self, _trigger_time: DateTime<Tz>) -> Result<(), FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                return Err(FetchError::new("quote provider unavailable"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn run_handles_events_and_reports_outcome() {
        let fetch = Arc::new(CountingFetch::default());
        let (sender, receiver) = trigger_channel(1);
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(
            TriggerDispatcher::new(fetch.clone()).run(receiver, shutdown.clone()),
        );

        let event = TriggerEvent::now_in(chrono_tz::America::New_York);
        assert!(sender.send(event).await.unwrap());
        assert!(sender.send(event).await.unwrap());
        assert_eq!(fetch.calls.load(Ordering::SeqCst), 2);

        shutdown.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn fetch_failure_is_reported_and_loop_survives() {
        let fetch = Arc::new(CountingFetch {
            calls: AtomicUsize::new(0),
            should_fail: true,
        });
        let (sender, receiver) = trigger_channel(1);
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(
            TriggerDispatcher::new(fetch.clone()).run(receiver, shutdown.clone()),
        );

        let event = TriggerEvent::now_in(chrono_tz::America::New_York);
        let err = sender.send(event).await.unwrap_err();
        assert_eq!(err.to_string(), "quote provider unavailable");

        let err = sender.send(event).await.unwrap_err();
        assert!(matches!(err, DispatchError::Handler { .. }));
        assert_eq!(fetch.calls.load(Ordering::SeqCst), 2);

        shutdown.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn run_stops_when_senders_dropped() {
        let (sender, receiver) = trigger_channel(1);
        drop(sender);

        tokio::time::timeout(
            std::time::Duration::from_secs(1),
            TriggerDispatcher::new(Arc::new(CountingFetch::default()))
                .run(receiver, CancellationToken::new()),
        )
        .await
        .unwrap();
    }
}
