use nomadgate_core::{AppError, AppResult};
use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;
use tracing::warn;
use url::Url;

/// Connection settings shared by the Nomad HTTP adapters.
#[derive(Debug, Clone)]
pub struct NomadApiConfig {
    address: Url,
    token: Option<String>,
    namespace: Option<String>,
    region: Option<String>,
}

impl NomadApiConfig {
    /// Creates settings for the agent at `address`.
    pub fn new(address: &str) -> AppResult<Self> {
        let address = Url::parse(address).map_err(|error| {
            AppError::Validation(format!("invalid Nomad address '{address}': {error}"))
        })?;
        if !matches!(address.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "Nomad address '{address}' must use http or https"
            )));
        }

        Ok(Self {
            address,
            token: None,
            namespace: None,
            region: None,
        })
    }

    /// Sends `token` as `X-Nomad-Token` on every request.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Scopes every request to `namespace`.
    #[must_use]
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    /// Scopes every request to `region`.
    #[must_use]
    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    /// Returns the agent address.
    #[must_use]
    pub fn address(&self) -> &Url {
        &self.address
    }

    /// Builds a request to the agent path made of `segments`.
    ///
    /// Each segment is percent-encoded, so `/`, `?` and `#` inside a segment stay part of it.
    pub(crate) fn request(
        &self,
        http_client: &reqwest::Client,
        method: Method,
        segments: &[&str],
    ) -> AppResult<RequestBuilder> {
        let mut url = self.address.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AppError::Internal(format!(
                    "Nomad address '{}' cannot carry a path",
                    self.address
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        if let Some(namespace) = &self.namespace {
            url.query_pairs_mut().append_pair("namespace", namespace);
        }
        if let Some(region) = &self.region {
            url.query_pairs_mut().append_pair("region", region);
        }

        let mut builder = http_client.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.header("X-Nomad-Token", token);
        }

        Ok(builder)
    }
}

/// Sends a request and returns the JSON body of a successful response.
///
/// Non-success responses yield the response body text as the error message.
pub(crate) async fn send_json(builder: RequestBuilder, operation: &str) -> AppResult<Value> {
    let response: Response = builder.send().await.map_err(|error| {
        warn!(operation, %error, "nomad request failed");
        AppError::Internal(format!("nomad {operation} request failed: {error}"))
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(operation, %status, "nomad rejected request");
        let message = if body.trim().is_empty() {
            format!("nomad {operation} returned status {status}")
        } else {
            body.trim().to_owned()
        };
        return Err(AppError::Internal(message));
    }

    response.json::<Value>().await.map_err(|error| {
        AppError::Internal(format!("nomad {operation} response is not JSON: {error}"))
    })
}
