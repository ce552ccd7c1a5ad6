use std::sync::Arc;

use nomadgate_core::AppError;
use nomadgate_domain::IssuerTrust;
use url::Url;

use crate::rejection::{Rejection, error_detail};
use crate::trust_ports::{IssuerTrustRepository, KeySet, KeySetSource, TokenVerifier, VerifiedClaims};

/// Token whose issuer is trusted and whose signature was verified.
#[derive(Debug, Clone, PartialEq)]
pub struct TrustedToken {
    /// Issuer trust entry the token was verified against.
    pub issuer: IssuerTrust,
    /// Verified claim set.
    pub claims: VerifiedClaims,
}

/// Resolves the trust chain of a token: issuer, key set, signature.
#[derive(Clone)]
pub struct TokenTrustService {
    issuer_repository: Arc<dyn IssuerTrustRepository>,
    key_set_source: Arc<dyn KeySetSource>,
    token_verifier: Arc<dyn TokenVerifier>,
}

impl TokenTrustService {
    /// Creates a token trust service.
    #[must_use]
    pub fn new(
        issuer_repository: Arc<dyn IssuerTrustRepository>,
        key_set_source: Arc<dyn KeySetSource>,
        token_verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self {
            issuer_repository,
            key_set_source,
            token_verifier,
        }
    }

    /// Reads the unverified `iss` claim.
    pub fn extract_issuer(&self, token: &str) -> Result<String, Rejection> {
        self.token_verifier
            .unverified_issuer(token)
            .map_err(|error| Rejection::InvalidToken {
                reason: error_detail(error),
            })
    }

    /// Looks up the trust entry for an issuer.
    pub async fn find_issuer(&self, issuer: &str) -> Result<IssuerTrust, Rejection> {
        self.issuer_repository
            .find_issuer(issuer)
            .await
            .map_err(Rejection::internal)?
            .map(|record| record.issuer)
            .ok_or_else(|| Rejection::UnknownIssuer {
                issuer: issuer.to_owned(),
            })
    }

    /// Fetches the key set published at `key_set_url`.
    pub async fn fetch_keys(&self, key_set_url: &Url) -> Result<KeySet, Rejection> {
        self.key_set_source
            .key_set(key_set_url)
            .await
            .map_err(|error| Rejection::KeyFetchFailed {
                reason: error_detail(error),
            })
    }

    /// Verifies the token against the key named by its `kid` header.
    pub fn verify(
        &self,
        token: &str,
        key_set: &KeySet,
        issuer: &IssuerTrust,
    ) -> Result<VerifiedClaims, Rejection> {
        let kid = self
            .token_verifier
            .key_id(token)
            .map_err(|error| Rejection::InvalidToken {
                reason: error_detail(error),
            })?
            .ok_or_else(|| Rejection::UnknownKey {
                reason: "token header has no 'kid'".to_owned(),
            })?;

        let jwk = key_set.get(&kid).ok_or_else(|| Rejection::UnknownKey {
            reason: format!("key '{kid}' is not in the issuer key set"),
        })?;

        self.token_verifier
            .verify(token, jwk, issuer.bound_issuer())
            .map_err(|error| match error {
                AppError::Validation(reason) => Rejection::InvalidToken { reason },
                other => Rejection::InvalidSignatureOrTime {
                    reason: error_detail(other),
                },
            })
    }

    /// Runs the full trust chain for one token.
    pub async fn resolve(&self, token: &str) -> Result<TrustedToken, Rejection> {
        let issuer_name = self.extract_issuer(token)?;
        let issuer = self.find_issuer(&issuer_name).await?;
        let key_set = self.fetch_keys(issuer.key_set_url()).await?;
        let claims = self.verify(token, &key_set, &issuer)?;

        Ok(TrustedToken { issuer, claims })
    }
}
