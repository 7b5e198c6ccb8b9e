//! Order cache subsystem.
//!
//! # Data Flow
//! ```text
//! OrderService (cache-aside)
//!     → memory.rs (DashMap with per-entry expiry, default)
//!     → redis.rs  (shared Redis, feature "redis")
//! ```
//!
//! Values are opaque strings (the service stores serialized orders). A miss
//! is a normal outcome and never an error.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use memory::InMemoryCache;
#[cfg(feature = "redis")]
pub use self::redis::RedisCache;

/// Result of a successful cache read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(String),
    Miss,
}

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// Transport or server failure.
    #[error("cache backend failure: {0}")]
    Backend(String),

    /// A stored value could not be decoded.
    #[error("corrupt cache entry for {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("cache call exceeded deadline of {0:?}")]
    Timeout(Duration),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Counters a backend may track about itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Key/value cache with per-entry time-to-live.
#[async_trait]
pub trait OrderCache: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<CacheLookup>;

    /// Store `value` under `key`, replacing any previous value and TTL.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Statistics, for backends that keep them.
    fn stats(&self) -> Option<CacheStats> {
        None
    }

    fn backend_name(&self) -> &'static str;
}
