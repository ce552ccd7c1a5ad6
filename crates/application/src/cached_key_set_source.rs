use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;
use url::Url;

use nomadgate_core::AppResult;

use crate::trust_ports::{KeySet, KeySetCache, KeySetSource};

/// Key set source that consults a cache before the wrapped source.
///
/// Cache read and write failures are logged and fall back to the wrapped
/// source. A ttl of zero disables the cache.
#[derive(Clone)]
pub struct CachedKeySetSource {
    inner: Arc<dyn KeySetSource>,
    cache: Arc<dyn KeySetCache>,
    ttl_seconds: u32,
}

impl CachedKeySetSource {
    /// Wraps `inner` with `cache`.
    #[must_use]
    pub fn new(inner: Arc<dyn KeySetSource>, cache: Arc<dyn KeySetCache>, ttl_seconds: u32) -> Self {
        Self {
            inner,
            cache,
            ttl_seconds,
        }
    }
}

#[async_trait]
impl KeySetSource for CachedKeySetSource {
    async fn key_set(&self, url: &Url) -> AppResult<KeySet> {
        if self.ttl_seconds > 0 {
            match self.cache.get_key_set(url).await {
                Ok(Some(key_set)) => return Ok(key_set),
                Ok(None) => {}
                Err(error) => warn!(%url, %error, "key set cache read failed"),
            }
        }

        let key_set = self.inner.key_set(url).await?;

        if self.ttl_seconds > 0
            && let Err(error) = self
                .cache
                .set_key_set(url, key_set.clone(), self.ttl_seconds)
                .await
        {
            warn!(%url, %error, "key set cache write failed");
        }

        Ok(key_set)
    }
}
