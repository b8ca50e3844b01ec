use async_trait::async_trait;
use redis::{AsyncCommands, RedisResult};
use tracing::{info, warn};
use voyage_core::{CoreError, CoreResult};

use crate::repository::SessionStore;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    pub async fn set_revoked(&self, jti: &str, ttl_seconds: u64) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("revoked:{}", jti);
        conn.set_ex::<_, _, ()>(key, 1, ttl_seconds.max(1)).await?;
        info!("Token revoked: {}", jti);
        Ok(())
    }

    pub async fn revoked_exists(&self, jti: &str) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("revoked:{}", jti);
        conn.exists(key).await
    }

    /// Counts a hit in the fixed window for `key`. The window's expiry is set once,
    /// by the hit that opens it, so later hits never extend it.
    pub async fn incr_window(&self, key: &str, window_seconds: i64) -> RedisResult<i64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("ratelimit:{}", key);

        let (count, ttl): (i64, i64) = redis::pipe()
            .atomic()
            .incr(&key, 1)
            .ttl(&key)
            .query_async(&mut conn)
            .await?;

        if window_needs_expiry(ttl) {
            conn.expire::<_, ()>(&key, window_seconds.max(1)).await?;
        }

        Ok(count)
    }
}

/// TTL reports -1 for a key with no expiry. That is a freshly opened window, or one
/// whose opener failed before setting it.
fn window_needs_expiry(ttl: i64) -> bool {
    ttl == -1
}

fn session_error(err: redis::RedisError) -> CoreError {
    warn!("Redis error: {}", err);
    CoreError::StorageError(err.to_string())
}

#[async_trait]
impl SessionStore for RedisClient {
    async fn revoke_token(&self, jti: &str, ttl_seconds: u64) -> CoreResult<()> {
        self.set_revoked(jti, ttl_seconds).await.map_err(session_error)
    }

    async fn is_revoked(&self, jti: &str) -> CoreResult<bool> {
        self.revoked_exists(jti).await.map_err(session_error)
    }

    async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> CoreResult<bool> {
        let count = self.incr_window(key, window_seconds).await.map_err(session_error)?;
        Ok(count <= limit)
    }
}
