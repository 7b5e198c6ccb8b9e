//! In-process cache with per-entry expiry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::cache::{CacheLookup, CacheResult, CacheStats, OrderCache};

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// Concurrent map of entries, each expiring after its own TTL.
///
/// Expired entries are dropped lazily when read, and in bulk by
/// [`purge_expired`] which [`spawn_sweeper`] runs on an interval.
/// Time is read from `tokio::time`, so paused-clock tests can advance it.
///
/// [`purge_expired`]: InMemoryCache::purge_expired
/// [`spawn_sweeper`]: InMemoryCache::spawn_sweeper
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: DashMap<String, Entry>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before - self.entries.len()
    }

    /// Purge expired entries every `every` until `shutdown` fires.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        every: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let purged = self.purge_expired();
                        if purged > 0 {
                            tracing::debug!(purged, remaining = self.len(), "Swept expired cache entries");
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("Cache sweeper stopping");
                        break;
                    }
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn miss(&self) -> CacheLookup {
        self.misses.fetch_add(1, Ordering::Relaxed);
        CacheLookup::Miss
    }
}

#[async_trait]
impl OrderCache for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<CacheLookup> {
        let now = Instant::now();
        let value = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => None,
            None => return Ok(self.miss()),
        };

        match value {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(CacheLookup::Hit(value))
            }
            None => {
                self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
                Ok(self.miss())
            }
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn stats(&self) -> Option<CacheStats> {
        Some(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = InMemoryCache::new();
        cache.set("order:1", "v1".into(), TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(
            cache.get("order:1").await.unwrap(),
            CacheLookup::Hit("v1".into())
        );

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("order:1").await.unwrap(), CacheLookup::Miss);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_refreshes_ttl() {
        let cache = InMemoryCache::new();
        cache.set("k", "old".into(), TTL).await.unwrap();
        tokio::time::advance(Duration::from_secs(50)).await;
        cache.set("k", "new".into(), TTL).await.unwrap();
        tokio::time::advance(Duration::from_secs(50)).await;

        assert_eq!(cache.get("k").await.unwrap(), CacheLookup::Hit("new".into()));
    }

    #[tokio::test]
    async fn test_delete_and_stats() {
        let cache = InMemoryCache::new();
        cache.set("k", "v".into(), TTL).await.unwrap();

        cache.get("k").await.unwrap();
        cache.delete("k").await.unwrap();
        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), CacheLookup::Miss);

        let stats = cache.stats().unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = InMemoryCache::new();
        cache.set("short", "a".into(), Duration::from_secs(1)).await.unwrap();
        cache.set("long", "b".into(), TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_drops_unread_expired_entries() {
        let cache = Arc::new(InMemoryCache::new());
        let (tx, rx) = broadcast::channel(1);
        let sweeper = cache.clone().spawn_sweeper(Duration::from_secs(10), rx);

        for i in 0..5 {
            cache.set(&format!("order:{}", i), "v".into(), Duration::from_secs(15)).await.unwrap();
        }
        cache.set("order:long", "v".into(), TTL).await.unwrap();

        // Ticks at 10s (nothing expired yet) and 20s (five entries gone).
        time::sleep(Duration::from_secs(25)).await;
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().unwrap().misses, 0);

        tx.send(()).unwrap();
        sweeper.await.unwrap();
    }
}
