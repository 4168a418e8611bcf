//! Price-Fetch Trigger DTOs

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

/// Outcome label of a manual trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerStatus {
    /// The event was delivered and handled.
    Success,
    /// The event was declined or the hand-off failed.
    Error,
}

/// Body returned by the manual trigger endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceFetchTriggerResponse {
    /// Outcome.
    pub status: TriggerStatus,
    /// Human-readable outcome.
    pub message: String,
    /// When the trigger was issued, in the scheduler's zone.
    pub triggered_at: DateTime<Tz>,
}

impl PriceFetchTriggerResponse {
    /// Successful trigger.
    #[must_use]
    pub fn success(triggered_at: DateTime<Tz>) -> Self {
        Self {
            status: TriggerStatus::Success,
            message: "Price fetch triggered successfully".to_string(),
            triggered_at,
        }
    }

    /// Failed trigger; `reason` is appended to the fixed prefix.
    #[must_use]
    pub fn failure(reason: &str, triggered_at: DateTime<Tz>) -> Self {
        Self {
            status: TriggerStatus::Error,
            message: format!("Price fetch failed: {reason}"),
            triggered_at,
        }
    }

    /// Whether the trigger succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == TriggerStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn serializes_with_wire_field_names() {
        let at = chrono_tz::America::New_York
            .with_ymd_and_hms(2025, 3, 14, 9, 0, 0)
            .unwrap();
        let body = serde_json::to_value(PriceFetchTriggerResponse::success(at)).unwrap();

        assert_eq!(body["status"], "SUCCESS");
        assert_eq!(body["message"], "Price fetch triggered successfully");
        assert_eq!(body["triggeredAt"], "2025-03-14T09:00:00-04:00");
    }

    #[test]
    fn failure_prefixes_reason() {
        let at = chrono_tz::America::New_York
            .with_ymd_and_hms(2025, 1, 2, 12, 0, 0)
            .unwrap();
        let response = PriceFetchTriggerResponse::failure("boom", at);

        assert!(!response.is_success());
        assert_eq!(response.message, "Price fetch failed: boom");
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["status"], "ERROR");
    }
}
