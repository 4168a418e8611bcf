//! Quote Gateway Binary
//!
//! Starts the REST gateway, the price-fetch scheduler and dispatcher, and the
//! credential cache eviction timer.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin quote-gateway
//! ```
//!
//! # Environment Variables
//!
//! ## Optional
//! - `GATEWAY_HTTP_PORT`: REST, health and metrics port (default: 8080)
//! - `PRICE_FETCHER_ENABLED`: Emit scheduled triggers (default: true)
//! - `PRICE_FETCHER_CRON`: Six-field cron (default: `0 0 9,12,15 * * *`)
//! - `PRICE_FETCHER_TIME_ZONE`: IANA zone (default: America/New_York)
//! - `SECRET_CACHE_EVICTION_CRON`: Full cache clear, host zone (default: `0 0 2,14 * * *`)
//! - `SECRET_STORE_BACKEND`: gcp | env (default: gcp)
//! - `SECRET_STORE_TIMEOUT_SECS`: Bound on one store call (default: 10)
//! - `SECRET_STORE_DIAGNOSTICS`: Probe provider secrets at start-up (default: false)
//! - `GCP_PROJECT_ID`: Namespace of the provider secrets (default: stock-api)
//! - `GCP_ACCESS_TOKEN`: Static Secret Manager token (default: metadata server)
//! - `ALPHAVANTAGE_BASE_URL`, `QUOTE_CLIENT_BASE_URL`: Upstream endpoints
//! - `UPSTREAM_TIMEOUT_SECS`: Upstream request timeout (default: 30)
//! - `OTEL_ENABLED`, `OTEL_EXPORTER_OTLP_ENDPOINT`, `OTEL_SERVICE_NAME`: Tracing export
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use quote_gateway::application::ports::{
    FetchServicePort, NoOpFetchService, QuoteProvider, QuoteProviderPort, SecretStorePort,
};
use quote_gateway::application::services::CredentialCache;
use quote_gateway::application::use_cases::TriggerPriceFetchUseCase;
use quote_gateway::infrastructure::config::{
    GatewayConfig, ProviderSettings, SecretStoreBackend, SecretStoreSettings,
};
use quote_gateway::infrastructure::dispatch::{TriggerDispatcher, trigger_channel};
use quote_gateway::infrastructure::http::{AppState, HealthState, HttpServer, create_router};
use quote_gateway::infrastructure::providers::{
    AlphaVantageClient, QuoteHttpClient, RequestAuthenticator, StockDataClient,
    build_http_client,
};
use quote_gateway::infrastructure::scheduling::{CacheEvictionTimer, TriggerScheduler};
use quote_gateway::infrastructure::secrets::{
    AccessTokenSource, EnvSecretStore, GcpSecretManagerStore, SecretStoreDiagnostics,
};
use quote_gateway::infrastructure::telemetry;
use quote_gateway::init_metrics;
use tokio::signal;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// How long background tasks get to finish after the server stops.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_dotenv();

    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting Quote Gateway");

    let _metrics_handle = init_metrics()?;

    let config = GatewayConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();
    let mut background = JoinSet::new();

    // Secret store and credential cache
    let store = build_secret_store(&config.secret_store)?;
    if config.secret_store.diagnostics {
        let outcomes = SecretStoreDiagnostics::new(Arc::clone(&store))
            .run(&config.provider_secrets())
            .await;
        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        tracing::info!(
            probed = outcomes.len(),
            failed,
            "Secret store diagnostics finished"
        );
    }
    let cache = Arc::new(CredentialCache::new(store));

    let eviction_timer =
        CacheEvictionTimer::new(Arc::clone(&cache), config.cache.eviction_schedule.clone());
    background.spawn(eviction_timer.run(shutdown_token.clone()));

    // Trigger pipeline: scheduler / manual endpoint -> channel -> dispatcher
    let (sender, receiver) = trigger_channel(config.scheduler.channel_capacity);
    let sender = Arc::new(sender);

    let fetch_service: Arc<dyn FetchServicePort> = Arc::new(NoOpFetchService);
    let dispatcher = TriggerDispatcher::new(fetch_service);
    background.spawn(dispatcher.run(receiver, shutdown_token.clone()));

    let scheduler = Arc::new(TriggerScheduler::new(
        sender.clone(),
        config.scheduler.schedule.clone(),
        config.scheduler.enabled,
    ));
    let scheduler_task = Arc::clone(&scheduler);
    let scheduler_shutdown = shutdown_token.clone();
    background.spawn(async move { scheduler_task.run(scheduler_shutdown).await });

    let trigger_price_fetch = Arc::new(TriggerPriceFetchUseCase::new(
        sender,
        config.scheduler.time_zone(),
    ));

    // Quote providers
    let upstream = build_http_client(config.upstream_timeout)?;
    let alpha_vantage: Arc<dyn QuoteProviderPort> = Arc::new(AlphaVantageClient::new(
        provider_client(QuoteProvider::AlphaVantage, &config.alpha_vantage, &upstream, &cache),
    ));
    let stock_data: Arc<dyn QuoteProviderPort> = Arc::new(StockDataClient::new(provider_client(
        QuoteProvider::StockData,
        &config.stock_data,
        &upstream,
        &cache,
    )));

    // HTTP server
    let state = AppState {
        trigger_price_fetch,
        alpha_vantage,
        stock_data,
        health: Arc::new(HealthState::new(
            env!("CARGO_PKG_VERSION").to_string(),
            Arc::clone(&cache),
            Arc::clone(&scheduler),
        )),
    };
    let server = HttpServer::new(
        config.server.http_port,
        create_router(state),
        shutdown_token.clone(),
    );

    tokio::spawn(await_shutdown(shutdown_token.clone()));

    tracing::info!("Quote Gateway ready");

    let served = server.run().await;
    shutdown_token.cancel();

    if tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        while background.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Background tasks did not stop in time"
        );
    }

    served?;
    tracing::info!("Quote Gateway stopped");
    Ok(())
}

/// Build the configured secret store backend.
fn build_secret_store(
    settings: &SecretStoreSettings,
) -> Result<Arc<dyn SecretStorePort>, reqwest::Error> {
    match settings.backend {
        SecretStoreBackend::Gcp => {
            let tokens = settings.gcp_access_token.clone().map_or_else(
                || AccessTokenSource::Metadata(settings.gcp_metadata_token_url.clone()),
                AccessTokenSource::Static,
            );
            let http = build_http_client(settings.timeout)?;
            Ok(Arc::new(GcpSecretManagerStore::new(
                http,
                settings.gcp_base_url.clone(),
                tokens,
                settings.timeout,
            )))
        }
        SecretStoreBackend::Env => {
            tracing::warn!("Using environment secret store; not for production");
            Ok(Arc::new(EnvSecretStore::from_env()))
        }
    }
}

/// Authenticated HTTP client for one provider.
fn provider_client(
    provider: QuoteProvider,
    settings: &ProviderSettings,
    http: &reqwest::Client,
    cache: &Arc<CredentialCache>,
) -> QuoteHttpClient {
    let authenticator = RequestAuthenticator::new(
        Arc::clone(cache),
        settings.secret.clone(),
        settings.query_param.clone(),
    );
    QuoteHttpClient::new(
        provider,
        http.clone(),
        settings.base_url.clone(),
        authenticator,
    )
}

/// Log the parsed configuration.
fn log_config(config: &GatewayConfig) {
    tracing::info!(
        http_port = config.server.http_port,
        scheduler_enabled = config.scheduler.enabled,
        price_fetcher_cron = config.scheduler.schedule.expression(),
        time_zone = %config.scheduler.time_zone(),
        eviction_cron = config.cache.eviction_schedule.expression(),
        secret_store = config.secret_store.backend.as_str(),
        "Configuration loaded"
    );
    tracing::debug!(
        alpha_vantage = %config.alpha_vantage.base_url,
        stock_data = %config.stock_data.base_url,
        upstream_timeout_secs = config.upstream_timeout.as_secs(),
        "Upstream endpoints"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for SIGTERM or Ctrl+C, then cancel `shutdown_token`.
///
/// If a handler cannot be installed the failure is logged and only the other
/// signal is awaited.
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
        () = shutdown_token.cancelled() => return,
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
