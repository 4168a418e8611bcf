//! Infrastructure Layer - Adapters and external integrations.
//!
//! Concrete implementations of the application ports, plus the HTTP surface
//! and process wiring (configuration, telemetry, metrics).

/// Environment-driven configuration.
pub mod config;

/// Single-consumer trigger channel and dispatcher.
pub mod dispatch;

/// Axum router, handlers and server.
pub mod http;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Authenticated quote provider clients.
pub mod providers;

/// Cron schedules, the price-fetch scheduler and the cache eviction timer.
pub mod scheduling;

/// Secret store backends and startup diagnostics.
pub mod secrets;

/// Tracing subscriber and OpenTelemetry integration.
pub mod telemetry;
