//! Configuration Module
//!
//! Configuration loading for the gateway service.

mod settings;

pub use settings::{
    CacheSettings, ConfigError, DEFAULT_EVICTION_CRON, DEFAULT_GCP_PROJECT_ID,
    DEFAULT_PRICE_FETCHER_CRON, DEFAULT_PRICE_FETCHER_TIME_ZONE, GatewayConfig, ProviderSettings,
    SchedulerSettings, SecretStoreBackend, SecretStoreSettings, ServerSettings,
};
