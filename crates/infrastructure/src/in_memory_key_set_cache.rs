use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use nomadgate_application::{KeySet, KeySetCache};
use nomadgate_core::AppResult;
use tokio::sync::RwLock;
use url::Url;

#[derive(Debug, Clone)]
struct KeySetCacheEntry {
    key_set: KeySet,
    expires_at: Instant,
}

/// In-memory cache adapter for fetched key sets.
#[derive(Default)]
pub struct InMemoryKeySetCache {
    entries: RwLock<HashMap<String, KeySetCacheEntry>>,
}

impl InMemoryKeySetCache {
    /// Creates an empty in-memory key set cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeySetCache for InMemoryKeySetCache {
    async fn get_key_set(&self, url: &Url) -> AppResult<Option<KeySet>> {
        {
            let entries = self.entries.read().await;
            match entries.get(url.as_str()) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.key_set.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(url.as_str())
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(url.as_str());
        }

        Ok(None)
    }

    async fn set_key_set(&self, url: &Url, key_set: KeySet, ttl_seconds: u32) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let now = Instant::now();
        let expires_at = now
            .checked_add(Duration::from_secs(u64::from(ttl_seconds)))
            .unwrap_or(now);

        self.entries.write().await.insert(
            url.as_str().to_owned(),
            KeySetCacheEntry {
                key_set,
                expires_at,
            },
        );

        Ok(())
    }
}
