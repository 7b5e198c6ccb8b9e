//! Redis-backed cache.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::cache::{CacheError, CacheLookup, CacheResult, OrderCache};

/// Cache shared between service instances through Redis.
///
/// `ConnectionManager` reconnects on its own; clones share one multiplexed
/// connection.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        let client = Client::open(redis_url).map_err(backend)?;
        let conn = ConnectionManager::new(client).await.map_err(backend)?;
        tracing::info!("Connected to redis");
        Ok(Self { conn })
    }
}

fn backend(err: redis::RedisError) -> CacheError {
    tracing::error!(error = %err, "Redis operation failed");
    CacheError::Backend(err.to_string())
}

#[async_trait]
impl OrderCache for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<CacheLookup> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await.map_err(backend)?;
        Ok(value.map_or(CacheLookup::Miss, CacheLookup::Hit))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1);
        let _: () = conn.set_ex(key, value, seconds).await.map_err(backend)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await.map_err(backend)?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
