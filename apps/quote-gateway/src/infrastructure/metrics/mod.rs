//! Prometheus Metrics Module
//!
//! Exposes application metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Credential cache**: Hits, misses, joined loads, load outcomes, evictions
//! - **Secret store**: Call outcomes by failure kind
//! - **Triggers**: Trigger outcomes by source, fetch durations
//! - **Providers**: Upstream request outcomes and latencies
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the HTTP server port. Recording
//! functions are no-ops until [`init_metrics`] installs the recorder, so unit
//! tests can call them freely.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::application::ports::QuoteProvider;
use crate::domain::trigger::TriggerSource;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Repeated calls return the handle installed by the first one.
///
/// # Errors
///
/// Returns `BuildError` if the global recorder cannot be installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    // Credential cache
    describe_counter!(
        "quote_gateway_credential_cache_requests_total",
        "Credential cache lookups by result (hit, miss, joined)"
    );
    describe_counter!(
        "quote_gateway_credential_loads_total",
        "Secret store loads started by the cache, by outcome"
    );
    describe_counter!(
        "quote_gateway_credential_evictions_total",
        "Entries dropped by full cache clears"
    );
    describe_gauge!(
        "quote_gateway_credential_cache_entries",
        "Number of loaded credential cache entries"
    );

    // Secret store
    describe_counter!(
        "quote_gateway_secret_store_calls_total",
        "Secret store calls by backend and outcome"
    );

    // Triggers
    describe_counter!(
        "quote_gateway_triggers_total",
        "Price-fetch triggers by source and outcome"
    );
    describe_histogram!(
        "quote_gateway_price_fetch_seconds",
        "Duration of one price-fetch cycle in the dispatcher"
    );

    // Providers
    describe_counter!(
        "quote_gateway_provider_requests_total",
        "Upstream quote requests by provider and outcome"
    );
    describe_histogram!(
        "quote_gateway_provider_request_seconds",
        "Upstream quote request latency"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record a credential cache hit.
pub fn record_cache_hit() {
    counter!("quote_gateway_credential_cache_requests_total", "result" => "hit").increment(1);
}

/// Record a credential cache miss that started a load.
pub fn record_cache_miss() {
    counter!("quote_gateway_credential_cache_requests_total", "result" => "miss").increment(1);
}

/// Record a caller joining an in-flight load.
pub fn record_cache_join() {
    counter!("quote_gateway_credential_cache_requests_total", "result" => "joined").increment(1);
}

/// Record the outcome of a cache-initiated load.
pub fn record_cache_load(outcome: &'static str) {
    counter!("quote_gateway_credential_loads_total", "outcome" => outcome).increment(1);
}

/// Record entries dropped by a full clear.
pub fn record_cache_eviction(count: usize) {
    counter!("quote_gateway_credential_evictions_total").increment(count as u64);
}

/// Update the loaded entry count.
#[allow(clippy::cast_precision_loss)]
pub fn set_cache_entries(count: usize) {
    gauge!("quote_gateway_credential_cache_entries").set(count as f64);
}

/// Record a secret store call outcome (`ok` or an error kind).
pub fn record_secret_store_call(backend: &'static str, outcome: &'static str) {
    counter!(
        "quote_gateway_secret_store_calls_total",
        "backend" => backend,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a trigger outcome.
pub fn record_trigger(source: TriggerSource, outcome: &'static str) {
    counter!(
        "quote_gateway_triggers_total",
        "source" => source.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record how long a price-fetch cycle took.
pub fn record_fetch_duration(outcome: &'static str, duration: Duration) {
    histogram!("quote_gateway_price_fetch_seconds", "outcome" => outcome)
        .record(duration.as_secs_f64());
}

/// Record an upstream provider request.
pub fn record_provider_request(provider: QuoteProvider, outcome: &'static str, duration: Duration) {
    counter!(
        "quote_gateway_provider_requests_total",
        "provider" => provider.as_str(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "quote_gateway_provider_request_seconds",
        "provider" => provider.as_str()
    )
    .record(duration.as_secs_f64());
}

// =============================================================================
// Tests
// =============================================================================
