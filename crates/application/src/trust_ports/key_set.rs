use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Value, json};
use url::Url;

use nomadgate_core::{AppError, AppResult};

/// Public signing keys of one issuer, indexed by key id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeySet {
    keys: BTreeMap<String, Value>,
}

impl KeySet {
    /// Builds a key set from a JWKS document `{"keys": [{"kid": ..., ...}]}`.
    ///
    /// Every entry must be an object with a string `kid` and `kty`.
    pub fn from_jwks(document: &Value) -> AppResult<Self> {
        let entries = document
            .get("keys")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                AppError::Validation("key set document must contain a 'keys' array".to_owned())
            })?;

        let mut keys = BTreeMap::new();
        for (index, entry) in entries.iter().enumerate() {
            if !entry.is_object() {
                return Err(AppError::Validation(format!(
                    "key set entry {index} is not an object"
                )));
            }

            let kid = entry.get("kid").and_then(Value::as_str).ok_or_else(|| {
                AppError::Validation(format!("key set entry {index} has no string 'kid'"))
            })?;

            if entry.get("kty").and_then(Value::as_str).is_none() {
                return Err(AppError::Validation(format!(
                    "key '{kid}' has no string 'kty'"
                )));
            }

            keys.insert(kid.to_owned(), entry.clone());
        }

        Ok(Self { keys })
    }

    /// Returns the JWK registered under `kid`.
    #[must_use]
    pub fn get(&self, kid: &str) -> Option<&Value> {
        self.keys.get(kid)
    }

    /// Iterates keys in key-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.keys.iter().map(|(kid, jwk)| (kid.as_str(), jwk))
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns whether the set holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Serializes the set back into a JWKS document.
    #[must_use]
    pub fn to_jwks(&self) -> Value {
        json!({ "keys": self.keys.values().cloned().collect::<Vec<_>>() })
    }
}

/// Port resolving an issuer's key set from its URL.
#[async_trait]
pub trait KeySetSource: Send + Sync {
    /// Fetches the key set published at `url`.
    async fn key_set(&self, url: &Url) -> AppResult<KeySet>;
}

/// Optional cache port for fetched key sets.
#[async_trait]
pub trait KeySetCache: Send + Sync {
    /// Returns the cached key set for one URL.
    async fn get_key_set(&self, url: &Url) -> AppResult<Option<KeySet>>;

    /// Stores a key set for one URL with ttl.
    async fn set_key_set(&self, url: &Url, key_set: KeySet, ttl_seconds: u32) -> AppResult<()>;
}
