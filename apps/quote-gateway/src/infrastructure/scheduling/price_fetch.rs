//! Price-Fetch Trigger Scheduler
//!
//! Emits one [`TriggerEvent`] per cron occurrence (default 09:00, 12:00 and
//! 15:00 America/New_York) into the trigger channel. When disabled it emits
//! nothing and the consumer is never invoked.
//!
//! Scheduled occurrences have no caller to report to: declines and dispatch
//! errors are logged and the occurrence is dropped. The next occurrence is
//! unaffected.

use std::sync::Arc;

use chrono::DateTime;
use chrono_tz::Tz;
use tokio_util::sync::CancellationToken;

use super::cron::{CronSchedule, run_schedule};
use crate::application::ports::{DispatchError, TriggerChannelPort};
use crate::domain::trigger::{TriggerEvent, TriggerSource};
use crate::infrastructure::metrics;

/// Cron-driven trigger producer.
pub struct TriggerScheduler {
    channel: Arc<dyn TriggerChannelPort>,
    schedule: CronSchedule<Tz>,
    enabled: bool,
}

impl TriggerScheduler {
    /// Create a scheduler sending into `channel`.
    #[must_use]
    pub fn new(
        channel: Arc<dyn TriggerChannelPort>,
        schedule: CronSchedule<Tz>,
        enabled: bool,
    ) -> Self {
        Self {
            channel,
            schedule,
            enabled,
        }
    }

    /// Whether the scheduler emits events.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Next scheduled fire time, or `None` when disabled.
    #[must_use]
    pub fn next_fire(&self) -> Option<DateTime<Tz>> {
        if !self.enabled {
            return None;
        }
        self.schedule.next_from_now().ok()
    }

    /// Emit the event for the occurrence at `at`.
    ///
    /// Returns `None` without touching the channel when disabled, otherwise
    /// the channel's answer.
    pub async fn fire(&self, at: DateTime<Tz>) -> Option<Result<bool, DispatchError>> {
        if !self.enabled {
            tracing::debug!(scheduled_for = %at, "Price fetcher disabled, skipping occurrence");
            return None;
        }

        tracing::info!(scheduled_for = %at, "Scheduled price fetch triggered");

        let result = self.channel.send(TriggerEvent::new(at)).await;
        match &result {
            Ok(true) => {
                metrics::record_trigger(TriggerSource::Scheduled, "success");
            }
            Ok(false) => {
                tracing::warn!(scheduled_for = %at, "Trigger channel declined scheduled event");
                metrics::record_trigger(TriggerSource::Scheduled, "declined");
            }
            Err(e) => {
                tracing::error!(scheduled_for = %at, error = %e, "Scheduled price fetch failed");
                metrics::record_trigger(TriggerSource::Scheduled, "error");
            }
        }
        Some(result)
    }

    /// Run until `shutdown` is cancelled. Returns immediately when disabled.
    pub async fn run(&self, shutdown: CancellationToken) {
        if !self.enabled {
            tracing::info!("Price fetcher disabled, scheduler not started");
            return;
        }

        tracing::info!(
            cron = self.schedule.expression(),
            time_zone = %self.schedule.zone(),
            "Price fetch scheduler started"
        );

        run_schedule("price-fetch", self.schedule.clone(), shutdown, move |at| async move {
            let _ = self.fire(at).await;
        })
        .await;
    }
}
