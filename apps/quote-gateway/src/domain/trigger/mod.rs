//! Price-Fetch Trigger Types
//!
//! A trigger is a single timestamp saying "a price fetch was requested at T".
//! Triggers come from the cron scheduler or from the on-demand API and are
//! consumed exactly once by the dispatcher.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// A request to run one price-fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEvent {
    requested_at: DateTime<Tz>,
}

impl TriggerEvent {
    /// Create an event for the given instant.
    #[must_use]
    pub const fn new(requested_at: DateTime<Tz>) -> Self {
        Self { requested_at }
    }

    /// Create an event stamped with the current time in `zone`.
    #[must_use]
    pub fn now_in(zone: Tz) -> Self {
        Self::new(Utc::now().with_timezone(&zone))
    }

    /// When the fetch was requested.
    #[must_use]
    pub const fn requested_at(&self) -> DateTime<Tz> {
        self.requested_at
    }
}

/// Which producer emitted a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    /// Cron scheduler.
    Scheduled,
    /// On-demand API call.
    Manual,
}

impl TriggerSource {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_in_uses_requested_zone() {
        let event = TriggerEvent::now_in(chrono_tz::America::New_York);
        assert_eq!(event.requested_at().timezone(), chrono_tz::America::New_York);
        let drift = Utc::now() - event.requested_at().with_timezone(&Utc);
        assert!(drift.num_seconds().abs() < 2);
    }

    #[test]
    fn source_labels() {
        assert_eq!(TriggerSource::Scheduled.as_str(), "scheduled");
        assert_eq!(TriggerSource::Manual.as_str(), "manual");
    }
}
