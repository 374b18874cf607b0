// Redis-backed limiter for multi-instance deployments: the same fixed-window
// semantics as the in-memory backend, with the counters held in a shared
// cache so all instances see one window per IP.

use crate::config::RedisConfig;
use crate::errors::Result;
use crate::rate_limit::{LimiterDecision, LoginLimiter};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;

/// Create a Redis connection manager
pub async fn create_client(config: &RedisConfig) -> Result<ConnectionManager> {
    tracing::info!("Connecting to Redis");

    let client = redis::Client::open(config.url.as_str())?;
    let manager = tokio::time::timeout(
        Duration::from_secs(config.connection_timeout_seconds),
        ConnectionManager::new(client),
    )
    .await
    .map_err(|_| crate::errors::AppError::Internal("Redis connection timed out".to_string()))??;

    tracing::info!("Redis connection established");

    Ok(manager)
}

pub struct RedisLoginLimiter {
    redis: ConnectionManager,
    window_seconds: i64,
    max_attempts: u32,
}

impl RedisLoginLimiter {
    pub fn new(redis: ConnectionManager, window_seconds: i64, max_attempts: u32) -> Self {
        Self {
            redis,
            window_seconds,
            max_attempts,
        }
    }

    fn key(ip: &str) -> String {
        format!("login_attempts:{}", ip)
    }
}

#[async_trait]
impl LoginLimiter for RedisLoginLimiter {
    async fn check(&self, ip: &str) -> Result<LimiterDecision> {
        // Counter with a window-length TTL set on first increment; INCR and
        // EXPIRE must be atomic so concurrent attempts share one window.
        let script = redis::Script::new(
            r#"
            local count = redis.call('INCR', KEYS[1])
            if count == 1 then
                redis.call('EXPIRE', KEYS[1], ARGV[1])
            end
            local ttl = redis.call('TTL', KEYS[1])
            return {count, ttl}
            "#,
        );

        let mut conn = self.redis.clone();
        let result: Vec<i64> = script
            .key(Self::key(ip))
            .arg(self.window_seconds)
            .invoke_async(&mut conn)
            .await?;

        let attempts = result[0].max(0) as u32;
        let ttl = result[1].max(0) as u64;
        let allowed = attempts <= self.max_attempts;

        if !allowed {
            tracing::warn!(ip = %ip, attempts = attempts, "Login rate limit hit");
        }

        Ok(LimiterDecision {
            allowed,
            attempts: attempts.min(self.max_attempts),
            limit: self.max_attempts,
            retry_after_seconds: if allowed { 0 } else { ttl },
        })
    }

    async fn clear(&self, ip: &str) -> Result<()> {
        use redis::AsyncCommands;

        let mut conn = self.redis.clone();
        let _: () = conn.del(Self::key(ip)).await?;

        Ok(())
    }
}
