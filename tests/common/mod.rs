//! Shared utilities for integration tests: fault-injecting backends and an
//! in-process server bound to an ephemeral port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;

use order_client::OrderClient;
use order_service::cache::{CacheError, CacheLookup, CacheResult, CacheStats, InMemoryCache, OrderCache};
use order_service::config::ServiceConfig;
use order_service::events::{EventNotifier, EventPublisher, InMemoryPublisher, PublishError};
use order_service::http::HttpServer;
use order_service::lifecycle::Shutdown;
use order_service::orders::{CachePolicy, Order, OrderId, OrderService};
use order_service::resilience::{DeadLetterQueue, RetryPolicy};
use order_service::store::{InMemoryOrderStore, OrderStore, StoreError, StoreResult};

pub const ADMIN_KEY: &str = "test-admin-key";

/// Store whose calls can be made to fail or stall.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: InMemoryOrderStore,
    /// Remaining reads that fail with a backend error.
    pub failing_reads: AtomicU32,
    pub down: AtomicBool,
    pub stall: AtomicBool,
    pub reads: AtomicU32,
}

impl FaultyStore {
    async fn gate(&self) -> StoreResult<()> {
        if self.stall.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("store unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for FaultyStore {
    async fn create(&self, order: Order) -> StoreResult<()> {
        self.gate().await?;
        self.inner.create(order).await
    }

    async fn get(&self, id: &OrderId) -> StoreResult<Order> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        let remaining = self.failing_reads.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_reads.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Backend("connection reset".into()));
        }
        self.inner.get(id).await
    }

    async fn update(&self, id: &OrderId, item: &str, quantity: u32) -> StoreResult<Order> {
        self.gate().await?;
        self.inner.update(id, item, quantity).await
    }

    async fn delete(&self, id: &OrderId) -> StoreResult<()> {
        self.gate().await?;
        self.inner.delete(id).await
    }

    async fn list(&self) -> StoreResult<Vec<Order>> {
        self.gate().await?;
        self.inner.list().await
    }

    fn backend_name(&self) -> &'static str {
        "faulty"
    }
}

/// Cache whose reads or writes can be made to fail.
#[derive(Default)]
pub struct FaultyCache {
    pub inner: InMemoryCache,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

#[async_trait]
impl OrderCache for FaultyCache {
    async fn get(&self, key: &str) -> CacheResult<CacheLookup> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("cache unreachable".into()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("cache is read-only".into()));
        }
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("cache is read-only".into()));
        }
        self.inner.delete(key).await
    }

    fn stats(&self) -> Option<CacheStats> {
        self.inner.stats()
    }

    fn backend_name(&self) -> &'static str {
        "faulty"
    }
}

/// Publisher that fails while `down` is set and otherwise forwards to a
/// broadcast channel.
pub struct FaultyPublisher {
    pub inner: InMemoryPublisher,
    pub down: AtomicBool,
    pub calls: AtomicU32,
}

impl Default for FaultyPublisher {
    fn default() -> Self {
        Self {
            inner: InMemoryPublisher::new(64),
            down: AtomicBool::new(false),
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl EventPublisher for FaultyPublisher {
    async fn publish(&self, topic: &str, key: &str, value: &str) -> Result<(), PublishError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(PublishError::Transport("broker unavailable".into()));
        }
        self.inner.publish(topic, key, value).await
    }

    fn backend_name(&self) -> &'static str {
        "faulty"
    }
}

/// Fault-injectable collaborators of one service instance.
pub struct Backends {
    pub store: Arc<FaultyStore>,
    pub cache: Arc<FaultyCache>,
    pub publisher: Arc<FaultyPublisher>,
}

impl Backends {
    pub fn new() -> Self {
        Self {
            store: Arc::new(FaultyStore::default()),
            cache: Arc::new(FaultyCache::default()),
            publisher: Arc::new(FaultyPublisher::default()),
        }
    }

    /// Service with short retry delays, suitable for real-time tests.
    pub fn service(&self, store: Arc<dyn OrderStore>, policy: CachePolicy) -> Arc<OrderService> {
        let notifier = EventNotifier::new(
            self.publisher.clone(),
            "orders",
            RetryPolicy::new(3, Duration::from_millis(5)),
            Duration::from_millis(200),
            DeadLetterQueue::new(32),
        );
        Arc::new(OrderService::new(store, self.cache.clone(), notifier, policy))
    }
}

pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.observability.metrics_enabled = false;
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.into();
    config
}

/// A running server and a client pointed at it.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: OrderClient,
    pub shutdown: Shutdown,
    pub service: Arc<OrderService>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn spawn_server(config: ServiceConfig, service: Arc<OrderService>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let server = HttpServer::new(Arc::new(config), service.clone());
    tokio::spawn(server.run(listener, shutdown.clone()));

    TestServer {
        addr,
        client: OrderClient::new(&format!("http://{}", addr)).with_admin_key(ADMIN_KEY),
        shutdown,
        service,
    }
}

/// Server over fault-injectable backends with the store used directly.
pub async fn spawn_faulty_server() -> (TestServer, Backends) {
    let backends = Backends::new();
    let service = backends.service(backends.store.clone(), CachePolicy::default());
    (spawn_server(test_config(), service).await, backends)
}

/// Wait until `condition` holds, polling for up to two seconds.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
