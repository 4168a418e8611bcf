//! Secret Store Diagnostics
//!
//! Optional start-up probe (`SECRET_STORE_DIAGNOSTICS=true`) that reads every
//! configured provider secret straight from the store, bypassing the cache,
//! and logs the outcome with a remediation hint. It never aborts start-up.

use std::sync::Arc;

use crate::application::ports::{SecretStoreError, SecretStorePort};
use crate::domain::credentials::SecretRef;

/// Result of probing one secret.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    /// Probed secret.
    pub secret: SecretRef,
    /// `None` on success, the failure otherwise.
    pub error: Option<SecretStoreError>,
}

impl ProbeOutcome {
    /// Whether the secret was readable.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Direct store prober.
pub struct SecretStoreDiagnostics {
    store: Arc<dyn SecretStorePort>,
}

impl SecretStoreDiagnostics {
    /// Create diagnostics over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn SecretStorePort>) -> Self {
        Self { store }
    }

    /// Probe each secret once and log the result.
    pub async fn run(&self, secrets: &[SecretRef]) -> Vec<ProbeOutcome> {
        tracing::info!(secrets = secrets.len(), "Running secret store diagnostics");

        let mut outcomes = Vec::with_capacity(secrets.len());
        for secret in secrets {
            let key = secret.cache_key();
            let error = match self.store.fetch(&key).await {
                Ok(_) => {
                    tracing::info!(key = %key, "Secret is readable");
                    None
                }
                Err(e) => {
                    tracing::error!(
                        key = %key,
                        kind = e.kind(),
                        error = %e,
                        hint = remediation_hint(&e, &secret.namespace),
                        "Secret is not readable"
                    );
                    Some(e)
                }
            };
            outcomes.push(ProbeOutcome {
                secret: secret.clone(),
                error,
            });
        }

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        tracing::info!(
            probed = outcomes.len(),
            failed,
            "Secret store diagnostics finished"
        );
        outcomes
    }
}

/// Suggested fix for a store failure.
#[must_use]
pub fn remediation_hint(error: &SecretStoreError, project: &str) -> String {
    match error {
        SecretStoreError::PermissionDenied { message }
            if message.to_lowercase().contains("billing") =>
        {
            format!(
                "billing is not enabled; link a billing account at https://console.cloud.google.com/billing?project={project}"
            )
        }
        SecretStoreError::PermissionDenied { .. } => format!(
            "grant roles/secretmanager.secretAccessor on project {project} and check the Secret Manager API is enabled"
        ),
        SecretStoreError::Unauthenticated { .. } => {
            "set GCP_ACCESS_TOKEN (gcloud auth print-access-token) or run with an attached service account".to_string()
        }
        SecretStoreError::NotFound { .. } => {
            format!("create the secret in project {project} or fix the configured secret id")
        }
        SecretStoreError::Transport { .. } | SecretStoreError::Timeout { .. } => {
            "check network access to the secret store endpoint".to_string()
        }
        SecretStoreError::InvalidPayload { .. } => "store the secret as UTF-8 text".to_string(),
        SecretStoreError::Backend { .. } => format!(
            "enable the API: gcloud services enable secretmanager.googleapis.com --project={project}"
        ),
    }
}
