use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use nomadgate_application::{TokenVerifier, VerifiedClaims};
use nomadgate_core::{AppError, AppResult};
use serde_json::{Map, Value};

/// Verifies CI job tokens with `jsonwebtoken` under one configured algorithm.
#[derive(Debug, Clone, Copy)]
pub struct JwtTokenVerifier {
    algorithm: Algorithm,
    leeway_seconds: u64,
}

impl JwtTokenVerifier {
    /// Creates a verifier accepting only `algorithm`, with `leeway_seconds` of clock skew.
    #[must_use]
    pub fn new(algorithm: Algorithm, leeway_seconds: u64) -> Self {
        Self {
            algorithm,
            leeway_seconds,
        }
    }

    fn ensure_jwk_matches_algorithm(&self, jwk: &Value) -> AppResult<()> {
        let Some(declared) = jwk.get("alg") else {
            return Ok(());
        };

        let matches = declared
            .as_str()
            .and_then(|raw| Algorithm::from_str(raw).ok())
            .is_some_and(|algorithm| algorithm == self.algorithm);
        if !matches {
            return Err(AppError::Unauthorized(format!(
                "key algorithm {declared} does not match {:?}",
                self.algorithm
            )));
        }

        Ok(())
    }

    fn validation(&self, bound_issuer: &str) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[bound_issuer]);
        validation
            .required_spec_claims
            .extend(["exp".to_owned(), "iss".to_owned()]);
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = self.leeway_seconds;
        validation
    }

    fn validate_iat(&self, claims: &Map<String, Value>) -> AppResult<()> {
        let Some(iat) = claims.get("iat") else {
            return Ok(());
        };

        let iat = iat
            .as_i64()
            .ok_or_else(|| AppError::Unauthorized("iat is not an integer".to_owned()))?;
        let leeway = i64::try_from(self.leeway_seconds).unwrap_or(i64::MAX);
        if iat > Utc::now().timestamp().saturating_add(leeway) {
            return Err(AppError::Unauthorized("iat is in the future".to_owned()));
        }

        Ok(())
    }
}

impl Default for JwtTokenVerifier {
    fn default() -> Self {
        Self::new(Algorithm::RS256, 0)
    }
}

impl TokenVerifier for JwtTokenVerifier {
    fn unverified_issuer(&self, token: &str) -> AppResult<String> {
        let mut parts = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AppError::Validation(
                "token must have three dot-separated segments".to_owned(),
            ));
        };

        let bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|error| {
            AppError::Validation(format!("token payload is not base64url: {error}"))
        })?;
        let claims = serde_json::from_slice::<Value>(&bytes).map_err(|error| {
            AppError::Validation(format!("token payload is not JSON: {error}"))
        })?;

        claims
            .get("iss")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| AppError::Validation("token has no string 'iss' claim".to_owned()))
    }

    fn key_id(&self, token: &str) -> AppResult<Option<String>> {
        decode_header(token)
            .map(|header| header.kid)
            .map_err(|error| AppError::Validation(format!("token header is malformed: {error}")))
    }

    fn verify(&self, token: &str, jwk: &Value, bound_issuer: &str) -> AppResult<VerifiedClaims> {
        let header = decode_header(token)
            .map_err(|error| AppError::Validation(format!("token header is malformed: {error}")))?;
        if header.alg != self.algorithm {
            return Err(AppError::Unauthorized(format!(
                "token algorithm {:?} is not accepted",
                header.alg
            )));
        }

        self.ensure_jwk_matches_algorithm(jwk)?;
        let jwk = serde_json::from_value::<Jwk>(jwk.clone())
            .map_err(|error| AppError::Unauthorized(format!("signing key is unusable: {error}")))?;
        let decoding_key = DecodingKey::from_jwk(&jwk)
            .map_err(|error| AppError::Unauthorized(format!("signing key is unusable: {error}")))?;

        let token_data =
            decode::<Map<String, Value>>(token, &decoding_key, &self.validation(bound_issuer))
                .map_err(|error| match error.kind() {
                    ErrorKind::InvalidToken
                    | ErrorKind::Base64(_)
                    | ErrorKind::Json(_)
                    | ErrorKind::Utf8(_) => {
                        AppError::Validation(format!("token is malformed: {error}"))
                    }
                    _ => AppError::Unauthorized(format!("token verification failed: {error}")),
                })?;

        self.validate_iat(&token_data.claims)?;
        Ok(VerifiedClaims::new(token_data.claims))
    }
}
