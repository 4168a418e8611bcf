//! Request Authenticator
//!
//! Step in the outbound request pipeline that resolves the provider
//! credential through the [`CredentialCache`] and appends it as a query
//! parameter. If the credential cannot be resolved the request is not sent.
//!
//! Existing query parameters are preserved; the credential is appended last.

use std::sync::Arc;

use reqwest::Request;

use crate::application::services::{CredentialCache, CredentialError};
use crate::domain::credentials::SecretRef;

/// Injects one provider credential into outbound requests.
#[derive(Debug, Clone)]
pub struct RequestAuthenticator {
    cache: Arc<CredentialCache>,
    secret: SecretRef,
    query_param: String,
}

impl RequestAuthenticator {
    /// Create an authenticator appending `secret` as `query_param`.
    #[must_use]
    pub fn new(
        cache: Arc<CredentialCache>,
        secret: SecretRef,
        query_param: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            secret,
            query_param: query_param.into(),
        }
    }

    /// The credential this authenticator injects.
    #[must_use]
    pub const fn secret(&self) -> &SecretRef {
        &self.secret
    }

    /// Name of the injected query parameter.
    #[must_use]
    pub fn query_param(&self) -> &str {
        &self.query_param
    }

    /// Append the credential to `request`.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` if the credential cannot be resolved; the
    /// request is dropped.
    pub async fn authenticate(&self, mut request: Request) -> Result<Request, CredentialError> {
        let value = self.cache.get_key(self.secret.cache_key()).await?;

        request
            .url_mut()
            .query_pairs_mut()
            .append_pair(&self.query_param, value.expose());

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockSecretStorePort, SecretStoreError};
    use crate::domain::credentials::SecretValue;

    fn request(url: &str) -> Request {
        reqwest::Client::new().get(url).build().unwrap()
    }

    fn authenticator(store: MockSecretStorePort, param: &str) -> RequestAuthenticator {
        RequestAuthenticator::new(
            Arc::new(CredentialCache::new(Arc::new(store))),
            SecretRef::latest("stock-api", "alphavantage-api-key"),
            param,
        )
    }

    #[tokio::test]
    async fn appends_credential_after_existing_params() {
        let mut store = MockSecretStorePort::new();
        store
            .expect_fetch()
            .returning(|_| Ok(SecretValue::new("av-key")));
        let auth = authenticator(store, "apikey");

        let request = auth
            .authenticate(request(
                "https://www.alphavantage.co/query?function=REALTIME_BULK_QUOTES&symbol=MSFT",
            ))
            .await
            .unwrap();

        assert_eq!(
            request.url().query(),
            Some("function=REALTIME_BULK_QUOTES&symbol=MSFT&apikey=av-key")
        );
    }

    #[tokio::test]
    async fn adds_query_when_url_has_none() {
        let mut store = MockSecretStorePort::new();
        store
            .expect_fetch()
            .returning(|_| Ok(SecretValue::new("tok en")));
        let auth = authenticator(store, "api_token");

        let request = auth
            .authenticate(request("https://api.stockdata.org/v1/data/quote"))
            .await
            .unwrap();

        assert_eq!(request.url().query(), Some("api_token=tok+en"));
    }

    #[tokio::test]
    async fn credential_failure_aborts() {
        let mut store = MockSecretStorePort::new();
        store.expect_fetch().returning(|_| {
            Err(SecretStoreError::Transport {
                message: "connection refused".to_string(),
            })
        });
        let auth = authenticator(store, "apikey");

        let err = auth
            .authenticate(request("https://www.alphavantage.co/query"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "transport");
    }
}
