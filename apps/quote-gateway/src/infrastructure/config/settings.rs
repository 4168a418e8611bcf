//! Gateway Configuration Settings
//!
//! Configuration types for the quote gateway, loaded from environment variables.
//!
//! Numeric and boolean values fall back to their defaults when unparsable.
//! Cron expressions, time zones, URLs and the secret store backend are
//! validated and reject bad input.

use std::time::Duration;

use chrono::Local;
use chrono_tz::Tz;
use reqwest::Url;

use crate::domain::credentials::SecretRef;
use crate::infrastructure::dispatch::DEFAULT_CHANNEL_CAPACITY;
use crate::infrastructure::scheduling::CronSchedule;
use crate::infrastructure::secrets::{DEFAULT_METADATA_TOKEN_URL, DEFAULT_SECRET_MANAGER_URL};

/// Default price-fetch fire times: 09:00, 12:00 and 15:00.
pub const DEFAULT_PRICE_FETCHER_CRON: &str = "0 0 9,12,15 * * *";

/// Default price-fetch time zone.
pub const DEFAULT_PRICE_FETCHER_TIME_ZONE: Tz = chrono_tz::America::New_York;

/// Default cache eviction times: 02:00 and 14:00 local.
pub const DEFAULT_EVICTION_CRON: &str = "0 0 2,14 * * *";

/// Default namespace for provider secrets.
pub const DEFAULT_GCP_PROJECT_ID: &str = "stock-api";

// =============================================================================
// Settings Types
// =============================================================================

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Listen port for the REST API, health and metrics.
    pub http_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { http_port: 8080 }
    }
}

/// Price-fetch scheduler settings.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Whether scheduled triggers are emitted.
    pub enabled: bool,
    /// Fire times, evaluated in `schedule.zone()`.
    pub schedule: CronSchedule<Tz>,
    /// Trigger consumer intake slots.
    pub channel_capacity: usize,
}

impl SchedulerSettings {
    /// Zone used for scheduled and manual triggers.
    #[must_use]
    pub fn time_zone(&self) -> Tz {
        *self.schedule.zone()
    }
}

/// Credential cache settings.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Full-clear times in the host's local zone.
    pub eviction_schedule: CronSchedule<Local>,
}

/// Which secret store backs the credential cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecretStoreBackend {
    /// GCP Secret Manager.
    #[default]
    Gcp,
    /// Process environment (development only).
    Env,
}

impl SecretStoreBackend {
    /// Parse a backend name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gcp" => Some(Self::Gcp),
            "env" => Some(Self::Env),
            _ => None,
        }
    }

    /// Backend name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gcp => "gcp",
            Self::Env => "env",
        }
    }
}

/// Secret store settings.
#[derive(Clone)]
pub struct SecretStoreSettings {
    /// Selected backend.
    pub backend: SecretStoreBackend,
    /// Bound on one store call.
    pub timeout: Duration,
    /// Secret Manager endpoint.
    pub gcp_base_url: Url,
    /// Static bearer token; the metadata server is used when unset.
    pub gcp_access_token: Option<String>,
    /// Metadata server token endpoint.
    pub gcp_metadata_token_url: Url,
    /// Run start-up diagnostics.
    pub diagnostics: bool,
}

impl std::fmt::Debug for SecretStoreSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStoreSettings")
            .field("backend", &self.backend)
            .field("timeout", &self.timeout)
            .field("gcp_base_url", &self.gcp_base_url.as_str())
            .field(
                "gcp_access_token",
                &self.gcp_access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("gcp_metadata_token_url", &self.gcp_metadata_token_url.as_str())
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

/// One upstream quote provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Base URL; request paths are joined onto it.
    pub base_url: Url,
    /// Credential location.
    pub secret: SecretRef,
    /// Query parameter carrying the credential.
    pub query_param: String,
}

/// Complete gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Price-fetch scheduler settings.
    pub scheduler: SchedulerSettings,
    /// Credential cache settings.
    pub cache: CacheSettings,
    /// Secret store settings.
    pub secret_store: SecretStoreSettings,
    /// Upstream request timeout.
    pub upstream_timeout: Duration,
    /// Alpha Vantage provider.
    pub alpha_vantage: ProviderSettings,
    /// StockData.org provider.
    pub stock_data: ProviderSettings,
}

impl GatewayConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let server = ServerSettings {
            http_port: env.parse_u16("GATEWAY_HTTP_PORT", ServerSettings::default().http_port),
        };

        let time_zone = match env.non_empty("PRICE_FETCHER_TIME_ZONE") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|e| ConfigError::invalid("PRICE_FETCHER_TIME_ZONE", e))?,
            None => DEFAULT_PRICE_FETCHER_TIME_ZONE,
        };
        let fetch_cron = env.string_or("PRICE_FETCHER_CRON", DEFAULT_PRICE_FETCHER_CRON);
        let scheduler = SchedulerSettings {
            enabled: env.parse_bool("PRICE_FETCHER_ENABLED", true),
            schedule: CronSchedule::parse(&fetch_cron, time_zone)
                .map_err(|e| ConfigError::invalid("PRICE_FETCHER_CRON", e))?,
            channel_capacity: env
                .parse_usize("PRICE_FETCHER_CHANNEL_CAPACITY", DEFAULT_CHANNEL_CAPACITY)
                .max(1),
        };

        let eviction_cron = env.string_or("SECRET_CACHE_EVICTION_CRON", DEFAULT_EVICTION_CRON);
        let cache = CacheSettings {
            eviction_schedule: CronSchedule::parse(&eviction_cron, Local)
                .map_err(|e| ConfigError::invalid("SECRET_CACHE_EVICTION_CRON", e))?,
        };

        let backend = match env.non_empty("SECRET_STORE_BACKEND") {
            Some(name) => SecretStoreBackend::parse(&name).ok_or_else(|| {
                ConfigError::invalid("SECRET_STORE_BACKEND", format!("unknown backend '{name}'"))
            })?,
            None => SecretStoreBackend::default(),
        };
        let secret_store = SecretStoreSettings {
            backend,
            timeout: env.parse_duration_secs("SECRET_STORE_TIMEOUT_SECS", Duration::from_secs(10)),
            gcp_base_url: env.url("GCP_SECRET_MANAGER_URL", DEFAULT_SECRET_MANAGER_URL)?,
            gcp_access_token: env.non_empty("GCP_ACCESS_TOKEN"),
            gcp_metadata_token_url: env.url("GCP_METADATA_TOKEN_URL", DEFAULT_METADATA_TOKEN_URL)?,
            diagnostics: env.parse_bool("SECRET_STORE_DIAGNOSTICS", false),
        };

        let project_id = env.string_or("GCP_PROJECT_ID", DEFAULT_GCP_PROJECT_ID);

        let alpha_vantage = env.provider(
            "ALPHAVANTAGE",
            "https://www.alphavantage.co/",
            &project_id,
            ("ALPHAVANTAGE_API_KEY_SECRET_ID", "alphavantage-api-key"),
            "apikey",
        )?;

        let stock_data = env.provider(
            "QUOTE_CLIENT",
            "https://api.stockdata.org/v1/",
            &project_id,
            ("QUOTE_CLIENT_API_TOKEN_SECRET_ID", "stockdata-api-token"),
            "api_token",
        )?;

        Ok(Self {
            server,
            scheduler,
            cache,
            secret_store,
            upstream_timeout: env
                .parse_duration_secs("UPSTREAM_TIMEOUT_SECS", Duration::from_secs(30)),
            alpha_vantage,
            stock_data,
        })
    }

    /// Every configured provider credential.
    #[must_use]
    pub fn provider_secrets(&self) -> Vec<SecretRef> {
        vec![
            self.alpha_vantage.secret.clone(),
            self.stock_data.secret.clone(),
        ]
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable is present but invalid.
    #[error("invalid value for {key}: {message}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// What was wrong.
        message: String,
    },
}

impl ConfigError {
    fn invalid(key: &str, message: impl std::fmt::Display) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        }
    }
}

// =============================================================================
// Parsing Helpers
// =============================================================================

struct Env<'a, F>(&'a F);

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn non_empty(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.non_empty(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_u16(&self, key: &str, default: u16) -> u16 {
        self.non_empty(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn parse_usize(&self, key: &str, default: usize) -> usize {
        self.non_empty(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn parse_duration_secs(&self, key: &str, default: Duration) -> Duration {
        self.non_empty(key)
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(default, Duration::from_secs)
    }

    fn parse_bool(&self, key: &str, default: bool) -> bool {
        match self.non_empty(key).map(|v| v.to_lowercase()).as_deref() {
            Some("true" | "1" | "yes" | "on") => true,
            Some("false" | "0" | "no" | "off") => false,
            _ => default,
        }
    }

    /// Parse a base URL, adding the trailing slash `Url::join` needs to keep
    /// the last path segment.
    fn url(&self, key: &str, default: &str) -> Result<Url, ConfigError> {
        let raw = self.string_or(key, default);
        let normalized = if raw.ends_with('/') {
            raw
        } else {
            format!("{raw}/")
        };
        let url = Url::parse(&normalized).map_err(|e| ConfigError::invalid(key, e))?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::invalid(key, "URL cannot be used as a base"));
        }
        Ok(url)
    }

    fn provider(
        &self,
        prefix: &str,
        default_base_url: &str,
        default_project: &str,
        (secret_id_key, default_secret_id): (&str, &str),
        default_param: &str,
    ) -> Result<ProviderSettings, ConfigError> {
        let base_url = self.url(&format!("{prefix}_BASE_URL"), default_base_url)?;
        let namespace = self.string_or(&format!("{prefix}_GCP_PROJECT_ID"), default_project);
        let secret_id = self.string_or(secret_id_key, default_secret_id);
        let version = self.non_empty(&format!("{prefix}_SECRET_VERSION"));
        let query_param = self.string_or(&format!("{prefix}_QUERY_PARAM"), default_param);

        Ok(ProviderSettings {
            base_url,
            secret: SecretRef {
                namespace,
                secret_id,
                version,
            },
            query_param,
        })
    }
}
