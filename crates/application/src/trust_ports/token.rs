use serde_json::{Map, Value};

use nomadgate_core::AppResult;

/// Claims of a token whose signature and time bounds were verified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerifiedClaims(Map<String, Value>);

impl VerifiedClaims {
    /// Wraps a verified claim map.
    #[must_use]
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    /// Returns the claim map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns one claim value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
}

/// Port wrapping the signed-token primitive.
///
/// `Validation` errors mean the token is malformed; `Unauthorized` errors mean
/// a signature, time bound or issuer check failed.
pub trait TokenVerifier: Send + Sync {
    /// Reads the `iss` claim without verifying the signature.
    fn unverified_issuer(&self, token: &str) -> AppResult<String>;

    /// Reads the `kid` header, if any.
    fn key_id(&self, token: &str) -> AppResult<Option<String>>;

    /// Verifies signature, time bounds and issuer against one JWK.
    fn verify(&self, token: &str, jwk: &Value, bound_issuer: &str) -> AppResult<VerifiedClaims>;
}
