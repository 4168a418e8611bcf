//! HTTP Controller (Driver Adapter)
//!
//! Axum-based REST API that delegates to application use cases.
//!
//! # Endpoints
//!
//! - `POST /api/price-fetcher/trigger` - Manual price fetch (always 200, outcome in body)
//! - `GET /alphavantage/realtime-bulk-quotes?symbols=` - Alpha Vantage pass-through
//! - `GET /quotes?symbols=` - StockData.org pass-through
//! - `GET /health` - JSON health status
//! - `GET /healthz` - Liveness probe
//! - `GET /metrics` - Prometheus metrics in text format

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;

use super::response::{CredentialCacheStatus, ErrorResponse, HealthResponse, SchedulerStatus};
use crate::application::ports::{ProviderError, QuoteProviderPort};
use crate::application::services::CredentialCache;
use crate::application::use_cases::TriggerPriceFetchUseCase;
use crate::infrastructure::metrics::get_metrics_handle;
use crate::infrastructure::providers::{DEFAULT_ALPHA_VANTAGE_SYMBOLS, DEFAULT_STOCK_DATA_SYMBOLS};
use crate::infrastructure::scheduling::TriggerScheduler;

// =============================================================================
// State
// =============================================================================

/// Inputs to the health endpoint.
pub struct HealthState {
    version: String,
    started_at: Instant,
    cache: Arc<CredentialCache>,
    scheduler: Arc<TriggerScheduler>,
}

impl HealthState {
    /// Create health state; uptime counts from now.
    #[must_use]
    pub fn new(
        version: String,
        cache: Arc<CredentialCache>,
        scheduler: Arc<TriggerScheduler>,
    ) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            cache,
            scheduler,
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Manual trigger use case.
    pub trigger_price_fetch: Arc<TriggerPriceFetchUseCase>,
    /// Alpha Vantage provider.
    pub alpha_vantage: Arc<dyn QuoteProviderPort>,
    /// StockData.org provider.
    pub stock_data: Arc<dyn QuoteProviderPort>,
    /// Health inputs.
    pub health: Arc<HealthState>,
}

/// Create the HTTP router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/price-fetcher/trigger", post(trigger_price_fetch))
        .route("/alphavantage/realtime-bulk-quotes", get(alpha_vantage_quotes))
        .route("/quotes", get(stock_data_quotes))
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

/// Manual trigger endpoint. Logical failures are reported in the body.
async fn trigger_price_fetch(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.trigger_price_fetch.execute().await)
}

#[derive(Debug, Deserialize)]
struct SymbolsQuery {
    symbols: Option<String>,
}

impl SymbolsQuery {
    fn symbols_or(self, default: &str) -> String {
        self.symbols
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default.to_string())
    }
}

async fn alpha_vantage_quotes(
    State(state): State<AppState>,
    Query(query): Query<SymbolsQuery>,
) -> Response {
    let symbols = query.symbols_or(DEFAULT_ALPHA_VANTAGE_SYMBOLS);
    pass_through(state.alpha_vantage.as_ref(), &symbols).await
}

async fn stock_data_quotes(
    State(state): State<AppState>,
    Query(query): Query<SymbolsQuery>,
) -> Response {
    let symbols = query.symbols_or(DEFAULT_STOCK_DATA_SYMBOLS);
    pass_through(state.stock_data.as_ref(), &symbols).await
}

async fn pass_through(provider: &dyn QuoteProviderPort, symbols: &str) -> Response {
    tracing::info!(provider = provider.provider().as_str(), symbols, "Fetching quotes");

    match provider.fetch_quotes(symbols).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => {
            let status = match e {
                ProviderError::RequestConstruction(_) => StatusCode::SERVICE_UNAVAILABLE,
                ProviderError::InvalidRequest { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                ProviderError::Transport { .. }
                | ProviderError::UpstreamStatus { .. }
                | ProviderError::Decode { .. } => StatusCode::BAD_GATEWAY,
            };
            let body = ErrorResponse {
                error: e.to_string(),
                kind: e.kind(),
            };
            (status, Json(body)).into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let health = &state.health;
    Json(HealthResponse {
        status: "healthy",
        version: health.version.clone(),
        uptime_secs: health.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        credential_cache: CredentialCacheStatus {
            entries: health.cache.len(),
        },
        scheduler: SchedulerStatus {
            enabled: health.scheduler.is_enabled(),
            next_fire: health.scheduler.next_fire(),
        },
    })
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            let body = handle.render();
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                body,
            )
        },
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        DispatchError, MockSecretStorePort, QuoteProvider, TriggerChannelPort,
    };
    use crate::application::services::CredentialError;
    use crate::domain::trigger::TriggerEvent;
    use crate::infrastructure::scheduling::CronSchedule;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use parking_lot::Mutex;
    use tower::ServiceExt;

    // Mock channel
    struct MockChannel {
        outcome: Result<bool, DispatchError>,
    }

    #[async_trait]
    impl TriggerChannelPort for MockChannel {
        async fn send(&self, _event: TriggerEvent) -> Result<bool, DispatchError> {
            self.outcome.clone()
        }
    }

    // Mock provider
    struct MockProvider {
        outcome: Result<serde_json::Value, ProviderError>,
        requested: Mutex<Vec<String>>,
    }

    impl MockProvider {
        fn new(outcome: Result<serde_json::Value, ProviderError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                requested: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl QuoteProviderPort for MockProvider {
        fn provider(&self) -> QuoteProvider {
            QuoteProvider::StockData
        }

        async fn fetch_quotes(&self, symbols: &str) -> Result<serde_json::Value, ProviderError> {
            self.requested.lock().push(symbols.to_string());
            self.outcome.clone()
        }
    }

    fn state(
        channel_outcome: Result<bool, DispatchError>,
        provider: Arc<MockProvider>,
    ) -> AppState {
        let zone = chrono_tz::America::New_York;
        let channel: Arc<dyn TriggerChannelPort> = Arc::new(MockChannel {
            outcome: channel_outcome,
        });
        let scheduler = Arc::new(TriggerScheduler::new(
            Arc::clone(&channel),
            CronSchedule::parse("0 0 9,12,15 * * *", zone).unwrap(),
            false,
        ));
        let cache = Arc::new(CredentialCache::new(Arc::new(MockSecretStorePort::new())));

        AppState {
            trigger_price_fetch: Arc::new(TriggerPriceFetchUseCase::new(channel, zone)),
            alpha_vantage: provider.clone(),
            stock_data: provider,
            health: Arc::new(HealthState::new("0.1.0".to_string(), cache, scheduler)),
        }
    }

    async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn trigger_success_returns_200() {
        let app = create_router(state(Ok(true), MockProvider::new(Ok(serde_json::json!({})))));

        let (status, body) = send(app, "POST", "/api/price-fetcher/trigger").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "SUCCESS");
        assert_eq!(body["message"], "Price fetch triggered successfully");
        assert!(body["triggeredAt"].is_string());
    }

    #[tokio::test]
    async fn trigger_failure_still_returns_200() {
        let app = create_router(state(
            Err(DispatchError::Transport {
                message: "boom".to_string(),
            }),
            MockProvider::new(Ok(serde_json::json!({}))),
        ));

        let (status, body) = send(app, "POST", "/api/price-fetcher/trigger").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ERROR");
        assert_eq!(body["message"], "Price fetch failed: boom");
    }

    #[tokio::test]
    async fn quotes_default_symbols_and_pass_body_through() {
        let provider = MockProvider::new(Ok(serde_json::json!({
            "data": { "NVDA": { "price": 1.0 } }
        })));
        let app = create_router(state(Ok(true), Arc::clone(&provider)));

        let (status, body) = send(app, "GET", "/quotes").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["NVDA"]["price"], 1.0);
        assert_eq!(provider.requested.lock().as_slice(), ["NVDA,MSFT,AAPL"]);
    }

    #[tokio::test]
    async fn alpha_vantage_uses_requested_symbols() {
        let provider = MockProvider::new(Ok(serde_json::json!({ "data": [] })));
        let app = create_router(state(Ok(true), Arc::clone(&provider)));

        let (status, _) = send(
            app,
            "GET",
            "/alphavantage/realtime-bulk-quotes?symbols=IBM,GRID",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(provider.requested.lock().as_slice(), ["IBM,GRID"]);
    }

    #[tokio::test]
    async fn credential_failure_is_503() {
        let provider = MockProvider::new(Err(ProviderError::RequestConstruction(
            CredentialError::Unavailable {
                key: "stock-api:stockdata-api-token:latest".to_string(),
                kind: "permission_denied",
                message: "denied".to_string(),
            },
        )));
        let app = create_router(state(Ok(true), provider));

        let (status, body) = send(app, "GET", "/quotes").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["kind"], "credential_unavailable");
    }

    #[tokio::test]
    async fn upstream_error_is_502() {
        let provider = MockProvider::new(Err(ProviderError::UpstreamStatus {
            status: 429,
            body: "rate limited".to_string(),
        }));
        let app = create_router(state(Ok(true), provider));

        let (status, body) = send(app, "GET", "/quotes?symbols=AAPL").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "upstream_status");
    }

    #[tokio::test]
    async fn health_reports_cache_and_scheduler() {
        let app = create_router(state(Ok(true), MockProvider::new(Ok(serde_json::json!({})))));

        let (status, body) = send(app, "GET", "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["credential_cache"]["entries"], 0);
        assert_eq!(body["scheduler"]["enabled"], false);
        assert!(body["scheduler"].get("next_fire").is_none());
    }

    #[tokio::test]
    async fn liveness_is_ok() {
        let app = create_router(state(Ok(true), MockProvider::new(Ok(serde_json::json!({})))));

        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_unavailable_until_recorder_installed() {
        let app = create_router(state(Ok(true), MockProvider::new(Ok(serde_json::json!({})))));

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
