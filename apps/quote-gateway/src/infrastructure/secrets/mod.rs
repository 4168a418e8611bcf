//! Secret Store Adapters
//!
//! Implementations of `SecretStorePort`:
//!
//! - `GcpSecretManagerStore`: GCP Secret Manager REST API (production)
//! - `EnvSecretStore`: Environment variables (local development)
//!
//! plus the optional start-up diagnostics.

mod diagnostics;
mod env;
mod gcp;

pub use diagnostics::{ProbeOutcome, SecretStoreDiagnostics, remediation_hint};
pub use env::EnvSecretStore;
pub use gcp::{
    AccessTokenSource, DEFAULT_METADATA_TOKEN_URL, DEFAULT_SECRET_MANAGER_URL,
    GcpSecretManagerStore,
};
