//! Trigger Channel Port (Driver-side hand-off)
//!
//! Interface that trigger producers (scheduler, on-demand API) use to hand a
//! [`TriggerEvent`] to the single dispatcher.

use async_trait::async_trait;

use super::FetchError;
use crate::domain::trigger::TriggerEvent;

/// Failure of the hand-off itself, as opposed to a declined send.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DispatchError {
    /// The consumer dropped the event without reporting completion.
    #[error("trigger consumer stopped before completing the event")]
    ConsumerLost,

    /// The consumer ran the fetch and it failed.
    #[error("{message}")]
    Handler {
        /// Fetch failure detail.
        message: String,
    },

    /// The transport malfunctioned.
    #[error("{message}")]
    Transport {
        /// Failure detail.
        message: String,
    },
}

/// Port for submitting trigger events.
#[async_trait]
pub trait TriggerChannelPort: Send + Sync {
    /// Deliver `event` to the consumer and wait for it to be handled.
    ///
    /// Returns `Ok(false)` when no consumer is registered or its intake is
    /// full. Nothing is queued or retried in that case.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError` if the hand-off or the handler fails.
    async fn send(&self, event: TriggerEvent) -> Result<bool, DispatchError>;
}

impl From<FetchError> for DispatchError {
    fn from(err: FetchError) -> Self {
        Self::Handler {
            message: err.message,
        }
    }
}
