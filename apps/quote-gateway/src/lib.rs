#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Quote Gateway - Credential-Injecting Stock Quote Gateway
//!
//! A REST service that re-exports third-party stock quote providers. Provider
//! API credentials live in a remote secret store and are injected into each
//! outbound request as a query parameter, served from a process-wide cache
//! that is cleared on a cron schedule. A scheduler and an on-demand endpoint
//! both hand price-fetch triggers to a single dispatcher.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Value types with no I/O
//!   - `credentials`: Cache keys, secret references, redacted secret values
//!   - `trigger`: Price-fetch trigger events and their sources
//!
//! - **Application**: Ports, services and use cases
//!   - `ports`: Secret store, quote provider, trigger channel, fetch service
//!   - `services`: Single-flight credential cache
//!   - `use_cases`: Manual price-fetch trigger
//!
//! - **Infrastructure**: Adapters and process wiring
//!   - `secrets`: GCP Secret Manager and environment stores, diagnostics
//!   - `providers`: Request authenticator and provider clients
//!   - `scheduling`: Cron schedules, trigger scheduler, eviction timer
//!   - `dispatch`: Trigger channel and dispatcher
//!   - `http`: REST, health and metrics endpoints
//!   - `config`, `telemetry`, `metrics`
//!
//! # Data Flow
//!
//! ```text
//!  cron ──► TriggerScheduler ──┐
//!                              ├──► TriggerChannel ──► TriggerDispatcher ──► fetch
//!  POST /api/price-fetcher ────┘
//!
//!  GET /quotes ──► provider client ──► RequestAuthenticator ──► upstream
//!                                            │
//!                                     CredentialCache ◄── eviction cron (clear)
//!                                            │
//!                                       SecretStore
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Value types with no external dependencies.
pub mod domain;

/// Application layer - Ports, services and use cases.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::credentials::{CacheEntry, CacheKey, LATEST_VERSION, SecretRef, SecretValue};
pub use domain::trigger::{TriggerEvent, TriggerSource};

// Application
pub use application::dto::{PriceFetchTriggerResponse, TriggerStatus};
pub use application::ports::{
    DispatchError, FetchError, FetchServicePort, ProviderError, QuoteProvider, QuoteProviderPort,
    SecretStoreError, SecretStorePort, TriggerChannelPort,
};
pub use application::services::{CredentialCache, CredentialError};
pub use application::use_cases::TriggerPriceFetchUseCase;

// Infrastructure config
pub use infrastructure::config::{ConfigError, GatewayConfig};

// Trigger pipeline (for integration tests)
pub use infrastructure::dispatch::{
    TriggerDispatcher, TriggerReceiver, TriggerSender, trigger_channel,
};
pub use infrastructure::scheduling::{CacheEvictionTimer, CronSchedule, TriggerScheduler};

// HTTP server
pub use infrastructure::http::{AppState, HealthState, HttpServer, ServerError, create_router};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
