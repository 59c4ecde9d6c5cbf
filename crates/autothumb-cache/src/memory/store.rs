//! In-memory cache implementation using the moka crate.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use tracing::debug;

use autothumb_core::config::cache::MemoryCacheConfig;
use autothumb_core::result::AppResult;
use autothumb_core::traits::cache::CacheProvider;

/// Cached string plus its own TTL.
#[derive(Debug, Clone)]
struct CachedValue {
    data: String,
    ttl: Option<Duration>,
}

/// Per-entry expiry: each value carries its own TTL, `None` never expires.
struct EntryExpiry;

impl Expiry<String, CachedValue> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// In-memory cache provider using moka.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    /// The underlying moka cache.
    cache: Cache<String, CachedValue>,
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(EntryExpiry)
            .build();

        Self { cache }
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.cache.get(key).await.map(|v| v.data))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        self.cache
            .insert(
                key.to_string(),
                CachedValue {
                    data: value.to_string(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.remove(key).await;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> AppResult<u64> {
        // Moka doesn't support pattern scanning, so trailing-wildcard
        // patterns become prefix matches over a snapshot of the keys.
        let prefix = pattern.trim_end_matches('*');

        let keys_to_remove: Vec<String> = self
            .cache
            .iter()
            .filter(|entry| entry.0.starts_with(prefix))
            .map(|entry| entry.0.to_string())
            .collect();

        let mut count = 0u64;
        for key in keys_to_remove {
            if self.cache.remove(&key).await.is_some() {
                count += 1;
            }
        }

        debug!(pattern, count, "Deleted keys matching pattern");
        Ok(count)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_provider() -> MemoryCacheProvider {
        MemoryCacheProvider::new(&MemoryCacheConfig { max_capacity: 1000 })
    }

    #[tokio::test]
    async fn test_set_get() {
        let provider = make_provider();
        provider.set("key1", "value1", None).await.unwrap();
        let val = provider.get("key1").await.unwrap();
        assert_eq!(val, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_delete() {
        let provider = make_provider();
        provider.set("key2", "value2", None).await.unwrap();
        provider.delete("key2").await.unwrap();
        assert_eq!(provider.get("key2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_pattern() {
        let provider = make_provider();
        provider.set("thumb:a.B:rec:t:1", "x", None).await.unwrap();
        provider.set("thumb:a.B:config:t", "x", None).await.unwrap();
        provider.set("thumb:a.C:rec:t:1", "x", None).await.unwrap();

        let removed = provider.delete_pattern("thumb:a.B:*").await.unwrap();
        assert_eq!(removed, 2);
        assert!(provider.get("thumb:a.B:rec:t:1").await.unwrap().is_none());
        assert!(provider.get("thumb:a.C:rec:t:1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_entry_ttl_expires() {
        let provider = make_provider();
        provider
            .set("short", "v", Some(Duration::from_millis(20)))
            .await
            .unwrap();
        provider.set("forever", "v", None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(provider.get("short").await.unwrap(), None);
        assert_eq!(provider.get("forever").await.unwrap(), Some("v".into()));
    }

    #[tokio::test]
    async fn test_always_healthy() {
        assert!(make_provider().health_check().await.unwrap());
    }
}
