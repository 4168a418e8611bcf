//! Secret Store Port (Driven Port)
//!
//! Interface for loading secret values from the remote secret store.

use async_trait::async_trait;

use crate::domain::credentials::{CacheKey, SecretValue};

/// Secret store failure.
///
/// `kind()` gives a stable label used in logs, metrics and the folded
/// `CredentialError`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SecretStoreError {
    /// Secret or version does not exist.
    #[error("secret not found: {key}")]
    NotFound {
        /// Composite key that was requested.
        key: String,
    },

    /// Caller lacks access to the secret.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Store-supplied detail.
        message: String,
    },

    /// No usable credentials for the store itself.
    #[error("unauthenticated: {message}")]
    Unauthenticated {
        /// Store-supplied detail.
        message: String,
    },

    /// Network-level failure reaching the store.
    #[error("secret store unreachable: {message}")]
    Transport {
        /// Underlying error text.
        message: String,
    },

    /// Store call exceeded the configured timeout.
    #[error("secret store call timed out after {timeout_secs}s")]
    Timeout {
        /// Configured bound in seconds.
        timeout_secs: u64,
    },

    /// Payload could not be decoded into a UTF-8 secret.
    #[error("invalid secret payload: {message}")]
    InvalidPayload {
        /// Decode failure detail.
        message: String,
    },

    /// Any other store-side failure.
    #[error("secret store error ({status}): {message}")]
    Backend {
        /// HTTP status or backend code.
        status: u16,
        /// Store-supplied detail.
        message: String,
    },
}

impl SecretStoreError {
    /// Stable failure label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::Unauthenticated { .. } => "unauthenticated",
            Self::Transport { .. } => "transport",
            Self::Timeout { .. } => "timeout",
            Self::InvalidPayload { .. } => "invalid_payload",
            Self::Backend { .. } => "backend",
        }
    }
}

/// Port for reading secrets.
///
/// Implementations must never log secret values.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SecretStorePort: Send + Sync {
    /// Load the secret addressed by `key`.
    async fn fetch(&self, key: &CacheKey) -> Result<SecretValue, SecretStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_are_stable() {
        assert_eq!(
            SecretStoreError::NotFound { key: "a:b:latest".to_string() }.kind(),
            "not_found"
        );
        assert_eq!(SecretStoreError::Timeout { timeout_secs: 5 }.kind(), "timeout");
        assert_eq!(
            SecretStoreError::Backend {
                status: 500,
                message: "boom".to_string()
            }
            .to_string(),
            "secret store error (500): boom"
        );
    }
}
