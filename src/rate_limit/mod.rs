// Login attempt limiting, keyed by client IP.
//
// The engine sees only the `LoginLimiter` trait: a windowed counter that is
// bumped on every attempt and cleared on successful authentication. The
// in-memory backend is the single-instance default; the Redis backend moves
// the counters into a shared cache for multi-instance deployments.

pub mod memory;
pub mod redis;

use crate::errors::Result;
use async_trait::async_trait;

pub use self::memory::MemoryLoginLimiter;
pub use self::redis::RedisLoginLimiter;

/// Outcome of one login-attempt check.
#[derive(Debug, Clone)]
pub struct LimiterDecision {
    pub allowed: bool,
    /// Attempts recorded in the current window, this one included when
    /// allowed.
    pub attempts: u32,
    pub limit: u32,
    /// Seconds until the window resets; zero when allowed.
    pub retry_after_seconds: u64,
}

#[async_trait]
pub trait LoginLimiter: Send + Sync {
    /// Record a login attempt for this IP and decide whether it may proceed.
    /// Attempts at or beyond the cap are rejected before credentials are
    /// examined.
    async fn check(&self, ip: &str) -> Result<LimiterDecision>;

    /// Forget the IP's attempt record (called after a successful login).
    async fn clear(&self, ip: &str) -> Result<()>;
}
