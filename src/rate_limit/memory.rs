// Default single-instance limiter: a fixed `{count, window_start}` window
// per IP held in a process-local map. Counters reset when the window has
// fully elapsed.

use crate::clock::Clock;
use crate::config::LoginLimitConfig;
use crate::errors::Result;
use crate::rate_limit::{LimiterDecision, LoginLimiter};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

struct AttemptWindow {
    count: u32,
    window_start: DateTime<Utc>,
}

pub struct MemoryLoginLimiter {
    clock: Arc<dyn Clock>,
    window: Duration,
    max_attempts: u32,
    attempts: DashMap<String, AttemptWindow>,
}

impl MemoryLoginLimiter {
    pub fn new(clock: Arc<dyn Clock>, config: &LoginLimitConfig) -> Self {
        Self {
            clock,
            window: Duration::seconds(config.window_seconds),
            max_attempts: config.max_attempts,
            attempts: DashMap::new(),
        }
    }
}

#[async_trait]
impl LoginLimiter for MemoryLoginLimiter {
    async fn check(&self, ip: &str) -> Result<LimiterDecision> {
        let now = self.clock.now();
        let mut entry = self
            .attempts
            .entry(ip.to_string())
            .or_insert_with(|| AttemptWindow {
                count: 0,
                window_start: now,
            });

        if now - entry.window_start > self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.max_attempts {
            let retry_after = (entry.window_start + self.window - now)
                .num_seconds()
                .max(0) as u64;
            tracing::warn!(ip = %ip, attempts = entry.count, "Login rate limit hit");
            return Ok(LimiterDecision {
                allowed: false,
                attempts: entry.count,
                limit: self.max_attempts,
                retry_after_seconds: retry_after,
            });
        }

        entry.count += 1;
        Ok(LimiterDecision {
            allowed: true,
            attempts: entry.count,
            limit: self.max_attempts,
            retry_after_seconds: 0,
        })
    }

    async fn clear(&self, ip: &str) -> Result<()> {
        self.attempts.remove(ip);
        Ok(())
    }
}
