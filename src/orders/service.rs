//! Cache-aside layer over the order store.
//!
//! # Responsibilities
//! - Validate caller input before any store mutation
//! - Serve reads from the cache, falling back to the store and repopulating
//! - Refresh the cache after updates and purge it after deletes
//! - Hand successful mutations to the event notifier
//!
//! # Failure Policy
//! - Store failures always surface
//! - A cache read failure surfaces; a cache miss is not a failure
//! - Cache writes after a successful store operation are best-effort: their
//!   failures are logged and counted, never returned

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheError, CacheLookup, CacheResult, CacheStats, OrderCache};
use crate::config::CacheConfig;
use crate::events::{EventNotifier, OrderEvent};
use crate::observability::metrics::{self, CacheOutcome};
use crate::orders::types::{validate_order, Order, OrderError, OrderId, OrderResult};
use crate::resilience::{with_timeout, TimeoutError};
use crate::store::OrderStore;

/// How the service uses its cache.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    /// Lifetime of every entry written.
    pub ttl: Duration,
    pub key_prefix: String,
    /// Deadline for a single cache call.
    pub op_timeout: Duration,
    pub purge_on_delete: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            key_prefix: "order:".to_string(),
            op_timeout: Duration::from_millis(500),
            purge_on_delete: true,
        }
    }
}

impl From<&CacheConfig> for CachePolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            ttl: Duration::from_secs(config.ttl_secs),
            key_prefix: config.key_prefix.clone(),
            op_timeout: Duration::from_millis(config.op_timeout_ms),
            purge_on_delete: config.purge_on_delete,
        }
    }
}

/// Order operations with cache-aside reads and best-effort event publishing.
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    cache: Arc<dyn OrderCache>,
    notifier: EventNotifier,
    policy: CachePolicy,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        cache: Arc<dyn OrderCache>,
        notifier: EventNotifier,
        policy: CachePolicy,
    ) -> Self {
        Self {
            store,
            cache,
            notifier,
            policy,
        }
    }

    pub fn notifier(&self) -> &EventNotifier {
        &self.notifier
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.stats()
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend_name()
    }

    pub fn cache_backend(&self) -> &'static str {
        self.cache.backend_name()
    }

    /// Validate, persist under a fresh id, and publish a `created` event.
    ///
    /// The cache is not written; the first read populates it.
    pub async fn create_order(&self, item: &str, quantity: u32) -> OrderResult<OrderId> {
        validate_order(item, quantity)?;

        let order = Order::new(OrderId::generate(), item, quantity);
        let id = order.id.clone();
        self.store.create(order.clone()).await?;

        tracing::info!(order_id = %id, item, quantity, "Order created");
        self.notifier.notify(OrderEvent::created(order));
        Ok(id)
    }

    /// Read through the cache.
    pub async fn get_order(&self, id: &OrderId) -> OrderResult<Order> {
        let key = self.cache_key(id);

        match self.cached(&key).await {
            Ok(Some(order)) => {
                metrics::record_cache_lookup(CacheOutcome::Hit);
                tracing::debug!(order_id = %id, "Cache hit");
                return Ok(order);
            }
            Ok(None) => {
                metrics::record_cache_lookup(CacheOutcome::Miss);
                tracing::debug!(order_id = %id, "Cache miss");
            }
            Err(err) => {
                metrics::record_cache_lookup(CacheOutcome::Error);
                tracing::error!(order_id = %id, error = %err, "Cache read failed");
                return Err(match err {
                    CacheError::Timeout(after) => OrderError::DeadlineExceeded(after),
                    other => OrderError::Cache(other),
                });
            }
        }

        let order = self.store.get(id).await?;

        if let Err(err) = self.write_cache(&key, &order).await {
            tracing::warn!(order_id = %id, error = %err, "Failed to populate cache");
        }
        Ok(order)
    }

    /// Replace the item and quantity of an existing order.
    pub async fn update_order(&self, id: &OrderId, item: &str, quantity: u32) -> OrderResult<Order> {
        self.store.get(id).await?;
        validate_order(item, quantity)?;

        let order = self.store.update(id, item, quantity).await?;

        let key = self.cache_key(id);
        if let Err(err) = self.write_cache(&key, &order).await {
            tracing::error!(order_id = %id, error = %err, "Failed to refresh cache after update");
            // The old entry must not outlive the update; the next read repopulates.
            let purge = self.cache_call(move |cache| async move { cache.delete(&key).await });
            if let Err(err) = purge.await {
                tracing::warn!(order_id = %id, error = %err, "Failed to purge stale cache entry");
            }
        }

        tracing::info!(order_id = %id, item, quantity, "Order updated");
        self.notifier.notify(OrderEvent::updated(order.clone()));
        Ok(order)
    }

    pub async fn delete_order(&self, id: &OrderId) -> OrderResult<bool> {
        self.store.get(id).await?;
        self.store.delete(id).await?;

        if self.policy.purge_on_delete {
            let key = self.cache_key(id);
            let purge = self.cache_call(move |cache| async move { cache.delete(&key).await });
            if let Err(err) = purge.await {
                tracing::warn!(order_id = %id, error = %err, "Failed to purge cache entry");
            }
        }

        tracing::info!(order_id = %id, "Order deleted");
        Ok(true)
    }

    /// Every stored order. Never touches the cache.
    pub async fn list_orders(&self) -> OrderResult<Vec<Order>> {
        Ok(self.store.list().await?)
    }

    fn cache_key(&self, id: &OrderId) -> String {
        format!("{}{}", self.policy.key_prefix, id)
    }

    async fn cached(&self, key: &str) -> CacheResult<Option<Order>> {
        let lookup_key = key.to_string();
        let lookup = self
            .cache_call(move |cache| async move { cache.get(&lookup_key).await })
            .await?;

        match lookup {
            CacheLookup::Miss => Ok(None),
            CacheLookup::Hit(value) => serde_json::from_str(&value)
                .map(Some)
                .map_err(|e| CacheError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    async fn write_cache(&self, key: &str, order: &Order) -> CacheResult<()> {
        let value = serde_json::to_string(order).map_err(|e| CacheError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        let key = key.to_string();
        let ttl = self.policy.ttl;
        self.cache_call(move |cache| async move { cache.set(&key, value, ttl).await })
            .await
    }

    /// Run one cache call under the configured deadline.
    async fn cache_call<T, F, Fut>(&self, call: F) -> CacheResult<T>
    where
        F: FnOnce(Arc<dyn OrderCache>) -> Fut,
        Fut: Future<Output = CacheResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        match with_timeout(call(Arc::clone(&self.cache)), self.policy.op_timeout).await {
            Ok(result) => result,
            Err(TimeoutError::DeadlineExceeded(after)) => Err(CacheError::Timeout(after)),
            Err(TimeoutError::Aborted(reason)) => Err(CacheError::Backend(reason)),
        }
    }
}
