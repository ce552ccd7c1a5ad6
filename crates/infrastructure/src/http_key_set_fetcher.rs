use async_trait::async_trait;
use jsonwebtoken::jwk::Jwk;
use nomadgate_application::{KeySet, KeySetSource};
use nomadgate_core::{AppError, AppResult};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::warn;
use url::Url;

/// Fetches JWKS documents over HTTP.
#[derive(Clone)]
pub struct HttpKeySetFetcher {
    http_client: reqwest::Client,
}

impl HttpKeySetFetcher {
    /// Creates a fetcher using the given client; timeouts are configured on the client.
    #[must_use]
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetFetcher {
    async fn key_set(&self, url: &Url) -> AppResult<KeySet> {
        let response = self
            .http_client
            .get(url.as_str())
            .send()
            .await
            .map_err(|error| {
                warn!(%url, %error, "key set request failed");
                AppError::Internal(format!("failed to fetch key set from '{url}': {error}"))
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(%url, %status, "key set endpoint returned non-200 status");
            return Err(AppError::Internal(format!(
                "key set endpoint '{url}' returned status {status}"
            )));
        }

        let document = response.json::<Value>().await.map_err(|error| {
            AppError::Validation(format!("key set from '{url}' is not valid JSON: {error}"))
        })?;

        let key_set = KeySet::from_jwks(&document)?;
        for (kid, jwk) in key_set.iter() {
            serde_json::from_value::<Jwk>(jwk.clone()).map_err(|error| {
                AppError::Validation(format!("key '{kid}' is not a valid JWK: {error}"))
            })?;
        }

        Ok(key_set)
    }
}
