//! Redis cache provider implementation.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use autothumb_core::error::{AppError, ErrorKind};
use autothumb_core::result::AppResult;
use autothumb_core::traits::cache::CacheProvider;

use super::client::RedisClient;

/// Redis-backed cache provider.
#[derive(Debug, Clone)]
pub struct RedisCacheProvider {
    /// Redis client.
    client: RedisClient,
}

impl RedisCacheProvider {
    /// Create a new Redis cache provider.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Map a Redis error to an AppError.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::CacheUnavailable, format!("Redis error: {e}"), e)
    }

    /// Run a command under the configured timeout.
    async fn bounded<T, F>(&self, op: &str, fut: F) -> AppResult<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.client.command_timeout(), fut).await {
            Ok(result) => result.map_err(Self::map_err),
            Err(_) => Err(AppError::cache_unavailable(format!(
                "Redis {op} timed out after {:?}",
                self.client.command_timeout()
            ))),
        }
    }
}

#[async_trait]
impl CacheProvider for RedisCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        self.bounded("GET", conn.get(&full_key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        match ttl {
            Some(ttl) => {
                self.bounded::<(), _>("SETEX", conn.set_ex(&full_key, value, ttl.as_secs().max(1)))
                    .await
            }
            None => self.bounded::<(), _>("SET", conn.set(&full_key, value)).await,
        }
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        self.bounded::<(), _>("DEL", conn.del(&full_key)).await
    }

    async fn delete_pattern(&self, pattern: &str) -> AppResult<u64> {
        let full_pattern = self.client.prefixed_key(pattern);
        let mut conn = self.client.conn_mut();

        let keys: Vec<String> = self
            .bounded(
                "KEYS",
                redis::cmd("KEYS")
                    .arg(&full_pattern)
                    .query_async(&mut conn),
            )
            .await?;

        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.client.conn_mut();
        let count: u64 = self.bounded("DEL", conn.del(&keys)).await?;

        debug!(pattern, count, "Deleted keys matching pattern");
        Ok(count)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = self
            .bounded("PING", redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(pong == "PONG")
    }
}
