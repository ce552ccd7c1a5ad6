use std::sync::Arc;

use nomadgate_application::{CachedKeySetSource, KeySetCache, KeySetSource};
use nomadgate_core::{AppError, AppResult};
use nomadgate_infrastructure::{HttpKeySetFetcher, InMemoryKeySetCache, RedisKeySetCache};

use crate::api_config::{ApiConfig, KeySetCacheBackend};

use super::super::redis::build_redis_client;

pub(super) fn build_key_set_source(
    config: &ApiConfig,
    http_client: reqwest::Client,
) -> AppResult<Arc<dyn KeySetSource>> {
    let fetcher: Arc<dyn KeySetSource> = Arc::new(HttpKeySetFetcher::new(http_client));

    let cache: Arc<dyn KeySetCache> = match config.key_set_cache_backend {
        KeySetCacheBackend::None => return Ok(fetcher),
        KeySetCacheBackend::InMemory => Arc::new(InMemoryKeySetCache::new()),
        KeySetCacheBackend::Redis => {
            let redis_url = config.redis_url.as_deref().ok_or_else(|| {
                AppError::Validation(
                    "REDIS_URL is required when KEY_SET_CACHE_BACKEND=redis".to_owned(),
                )
            })?;
            Arc::new(RedisKeySetCache::new(
                build_redis_client(redis_url)?,
                "nomadgate:key_set",
            ))
        }
    };

    Ok(Arc::new(CachedKeySetSource::new(
        fetcher,
        cache,
        config.key_set_cache_ttl_seconds,
    )))
}
