//! Trigger Channel
//!
//! Bounded single-consumer hand-off between trigger producers and the
//! dispatcher. `send` waits for the consumer to finish handling the event,
//! so producers observe the fetch outcome.
//!
//! The receiving half is not `Clone`; exactly one dispatcher can own it.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::application::ports::{DispatchError, TriggerChannelPort};
use crate::domain::trigger::TriggerEvent;

/// Default consumer intake: one queued event besides the one in progress.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// Create a connected sender/receiver pair with `capacity` intake slots.
///
/// A capacity of zero is raised to one.
#[must_use]
pub fn trigger_channel(capacity: usize) -> (TriggerSender, TriggerReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (TriggerSender { tx }, TriggerReceiver { rx })
}

/// An event in transit together with its completion handle.
#[derive(Debug)]
pub struct TriggerDelivery {
    event: TriggerEvent,
    completion: oneshot::Sender<Result<(), DispatchError>>,
}

impl TriggerDelivery {
    /// The delivered event.
    #[must_use]
    pub const fn event(&self) -> TriggerEvent {
        self.event
    }

    /// Report the handling outcome back to the sender.
    pub fn complete(self, outcome: Result<(), DispatchError>) {
        if self.completion.send(outcome).is_err() {
            tracing::debug!("Trigger sender went away before completion");
        }
    }
}

/// Producer half. Cheap to clone; the scheduler and the manual trigger
/// share one.
#[derive(Debug, Clone)]
pub struct TriggerSender {
    tx: mpsc::Sender<TriggerDelivery>,
}

#[async_trait]
impl TriggerChannelPort for TriggerSender {
    async fn send(&self, event: TriggerEvent) -> Result<bool, DispatchError> {
        let (completion, done) = oneshot::channel();

        match self.tx.try_send(TriggerDelivery { event, completion }) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    requested_at = %event.requested_at(),
                    "Trigger consumer busy, event declined"
                );
                return Ok(false);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(
                    requested_at = %event.requested_at(),
                    "No trigger consumer registered, event declined"
                );
                return Ok(false);
            }
        }

        match done.await {
            Ok(Ok(())) => Ok(true),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(DispatchError::ConsumerLost),
        }
    }
}

/// Consumer half.
#[derive(Debug)]
pub struct TriggerReceiver {
    rx: mpsc::Receiver<TriggerDelivery>,
}

impl TriggerReceiver {
    /// Wait for the next delivery. `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<TriggerDelivery> {
        self.rx.recv().await
    }
}
