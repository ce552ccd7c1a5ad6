//! Redis-backed key set cache.

use async_trait::async_trait;
use nomadgate_application::{KeySet, KeySetCache};
use nomadgate_core::{AppError, AppResult};
use redis::AsyncCommands;
use serde_json::Value;
use url::Url;

/// Redis implementation of the key set cache port.
///
/// Entries hold the JWKS document as JSON text keyed by URL.
#[derive(Clone)]
pub struct RedisKeySetCache {
    client: redis::Client,
    key_prefix: String,
}

impl RedisKeySetCache {
    /// Creates a cache adapter with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, url: &Url) -> String {
        format!("{}:{}", self.key_prefix, url.as_str())
    }

    fn decode_key_set(value: &str) -> AppResult<KeySet> {
        let document = serde_json::from_str::<Value>(value).map_err(|error| {
            AppError::Internal(format!("invalid key set cache value: {error}"))
        })?;

        KeySet::from_jwks(&document)
            .map_err(|error| AppError::Internal(format!("invalid key set cache value: {error}")))
    }
}

#[async_trait]
impl KeySetCache for RedisKeySetCache {
    async fn get_key_set(&self, url: &Url) -> AppResult<Option<KeySet>> {
        let key = self.key_for(url);
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))?;

        let encoded: Option<String> = connection.get(key).await.map_err(|error| {
            AppError::Internal(format!("failed to read key set cache entry: {error}"))
        })?;

        encoded.as_deref().map(Self::decode_key_set).transpose()
    }

    async fn set_key_set(&self, url: &Url, key_set: KeySet, ttl_seconds: u32) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let key = self.key_for(url);
        let value = key_set.to_jwks().to_string();
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))?;

        connection
            .set_ex(key, value, u64::from(ttl_seconds))
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to write key set cache entry: {error}"))
            })
    }
}
