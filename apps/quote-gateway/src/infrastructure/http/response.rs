//! HTTP response DTOs.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" while the process serves requests.
    pub status: &'static str,
    /// Gateway version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Credential cache state.
    pub credential_cache: CredentialCacheStatus,
    /// Price-fetch scheduler state.
    pub scheduler: SchedulerStatus,
}

/// Credential cache state.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialCacheStatus {
    /// Loaded entries.
    pub entries: usize,
}

/// Price-fetch scheduler state.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    /// Whether scheduled triggers are emitted.
    pub enabled: bool,
    /// Next scheduled fire time, if enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_fire: Option<DateTime<Tz>>,
}

/// Error body for failed provider pass-through calls.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Human-readable failure.
    pub error: String,
    /// Stable failure label.
    pub kind: &'static str,
}
