use nomadgate_core::{AppError, AppResult, NonEmptyString};
use url::Url;

/// Trust anchor mapping a token issuer to its signing key set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerTrust {
    bound_issuer: NonEmptyString,
    key_set_url: Url,
}

impl IssuerTrust {
    /// Creates an issuer trust entry.
    ///
    /// `key_set_url` must be an absolute `http` or `https` URL.
    pub fn new(bound_issuer: impl Into<String>, key_set_url: &str) -> AppResult<Self> {
        let bound_issuer = NonEmptyString::new(bound_issuer)?;
        let key_set_url = Url::parse(key_set_url.trim()).map_err(|error| {
            AppError::Validation(format!("invalid key set url '{key_set_url}': {error}"))
        })?;

        if !matches!(key_set_url.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "key set url must use http or https, got '{}'",
                key_set_url.scheme()
            )));
        }

        Ok(Self {
            bound_issuer,
            key_set_url,
        })
    }

    /// Returns the issuer a token's `iss` claim must equal.
    #[must_use]
    pub fn bound_issuer(&self) -> &str {
        self.bound_issuer.as_str()
    }

    /// Returns the key set location.
    #[must_use]
    pub fn key_set_url(&self) -> &Url {
        &self.key_set_url
    }
}
