//! Cron Schedules
//!
//! Six-field cron expressions (`sec min hour day-of-month month day-of-week`)
//! evaluated in a fixed time zone, plus the timer loop shared by the
//! price-fetch scheduler and the cache eviction timer.
//!
//! Occurrences missed while a callback is still running are skipped, not
//! replayed.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use croner::Cron;
use tokio_util::sync::CancellationToken;

/// Schedule construction or evaluation failure.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// Expression did not parse.
    #[error("invalid cron expression '{expression}': {message}")]
    InvalidExpression {
        /// Offending expression.
        expression: String,
        /// Parser detail.
        message: String,
    },

    /// No further occurrence could be computed.
    #[error("no next occurrence for '{expression}': {message}")]
    NoNextOccurrence {
        /// Expression being evaluated.
        expression: String,
        /// Evaluator detail.
        message: String,
    },
}

/// A parsed cron expression bound to a time zone.
#[derive(Debug, Clone)]
pub struct CronSchedule<Z: TimeZone> {
    expression: String,
    cron: Cron,
    zone: Z,
}

impl<Z: TimeZone> CronSchedule<Z> {
    /// Parse `expression` and bind it to `zone`.
    ///
    /// A five-field expression is accepted and treated as firing at second 0.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError::InvalidExpression` if the expression is malformed.
    pub fn parse(expression: &str, zone: Z) -> Result<Self, ScheduleError> {
        let cron = Cron::new(expression)
            .with_seconds_optional()
            .parse()
            .map_err(|e| ScheduleError::InvalidExpression {
                expression: expression.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            expression: expression.to_string(),
            cron,
            zone,
        })
    }

    /// The source expression.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The zone occurrences are evaluated in.
    #[must_use]
    pub const fn zone(&self) -> &Z {
        &self.zone
    }

    /// First occurrence strictly after `after`.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError::NoNextOccurrence` if the expression never fires again.
    pub fn next_after(&self, after: &DateTime<Z>) -> Result<DateTime<Z>, ScheduleError> {
        self.cron
            .find_next_occurrence(after, false)
            .map_err(|e| ScheduleError::NoNextOccurrence {
                expression: self.expression.clone(),
                message: e.to_string(),
            })
    }

    /// First occurrence after the current instant.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError::NoNextOccurrence` if the expression never fires again.
    pub fn next_from_now(&self) -> Result<DateTime<Z>, ScheduleError> {
        self.next_after(&Utc::now().with_timezone(&self.zone))
    }
}

/// Run `on_fire` at every occurrence of `schedule` until `shutdown` is cancelled.
///
/// Each callback receives the scheduled instant, not the wake-up time. The
/// next occurrence is computed after the callback returns.
pub async fn run_schedule<Z, F, Fut>(
    name: &'static str,
    schedule: CronSchedule<Z>,
    shutdown: CancellationToken,
    mut on_fire: F,
) where
    Z: TimeZone + Send + Sync,
    Z::Offset: Send + Sync,
    F: FnMut(DateTime<Z>) -> Fut + Send,
    Fut: Future<Output = ()> + Send,
{
    let mut last_fired: Option<DateTime<Utc>> = None;

    tracing::info!(timer = name, cron = schedule.expression(), "Timer started");

    loop {
        let now = Utc::now();
        let from = match last_fired {
            Some(last) if last >= now => last,
            _ => now,
        };

        let next = match schedule.next_after(&from.with_timezone(schedule.zone())) {
            Ok(next) => next,
            Err(e) => {
                tracing::error!(timer = name, error = %e, "Timer stopped, no further occurrences");
                return;
            }
        };

        let next_utc = next.with_timezone(&Utc);
        let wait = (next_utc - Utc::now()).to_std().unwrap_or(Duration::ZERO);

        tracing::debug!(timer = name, next = %next_utc, "Timer sleeping until next occurrence");

        tokio::select! {
            () = shutdown.cancelled() => {
                tracing::info!(timer = name, "Timer stopped");
                return;
            }
            () = tokio::time::sleep(wait) => {}
        }

        last_fired = Some(next_utc);
        on_fire(next).await;
    }
}
