//! Startup orchestration.
//!
//! # Responsibilities
//! - Construct the configured store, cache and event publisher
//! - Wrap the store with the resilience decorator when enabled
//! - Start background tasks (event logger, in-memory cache sweeper)
//! - Assemble the `OrderService`
//!
//! Backends compiled out by feature flags are reported as startup errors
//! rather than silently replaced.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::cache::{CacheError, InMemoryCache, OrderCache};
use crate::config::{
    CacheBackend, CacheConfig, EventsBackend, ServiceConfig, StoreBackend, StoreConfig,
};
use crate::events::{EventLogger, EventNotifier, EventPublisher, InMemoryPublisher, PublishError};
use crate::lifecycle::Shutdown;
use crate::orders::{CachePolicy, OrderService};
use crate::resilience::{DeadLetterQueue, RetryPolicy};
use crate::store::{InMemoryOrderStore, OrderStore, ResilientStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("store initialisation failed: {0}")]
    Store(#[from] StoreError),

    #[error("cache initialisation failed: {0}")]
    Cache(#[from] CacheError),

    #[error("event publisher initialisation failed: {0}")]
    Events(#[from] PublishError),

    #[error("{0} is required for the selected backend")]
    MissingSetting(&'static str),

    #[error("backend '{backend}' requires building with feature '{feature}'")]
    FeatureDisabled {
        backend: &'static str,
        feature: &'static str,
    },
}

/// Build the order service from configuration.
///
/// Background tasks started here stop when `shutdown` is triggered.
pub async fn build_service(
    config: &ServiceConfig,
    shutdown: &Shutdown,
) -> Result<Arc<OrderService>, StartupError> {
    let store = build_store(config).await?;
    let cache = build_cache(&config.cache, shutdown).await?;
    let publisher = build_publisher(config, shutdown)?;

    let resilience = &config.resilience;
    let notifier = EventNotifier::new(
        publisher,
        config.events.topic.as_str(),
        RetryPolicy::from(&resilience.retry),
        Duration::from_millis(resilience.publish_timeout_ms),
        DeadLetterQueue::new(resilience.dead_letter_capacity),
    );

    tracing::info!(
        store = store.backend_name(),
        cache = cache.backend_name(),
        events = notifier.publisher_name(),
        topic = notifier.topic(),
        "Order service assembled"
    );

    Ok(Arc::new(OrderService::new(
        store,
        cache,
        notifier,
        CachePolicy::from(&config.cache),
    )))
}

async fn build_store(config: &ServiceConfig) -> Result<Arc<dyn OrderStore>, StartupError> {
    let store: Arc<dyn OrderStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(InMemoryOrderStore::new()),
        StoreBackend::Postgres => connect_postgres(&config.store).await?,
    };

    let resilience = &config.resilience;
    if !resilience.store_enabled {
        return Ok(store);
    }
    Ok(Arc::new(ResilientStore::new(
        store,
        Duration::from_millis(resilience.store_timeout_ms),
        RetryPolicy::from(&resilience.retry),
    )))
}

#[cfg(feature = "postgres")]
async fn connect_postgres(config: &StoreConfig) -> Result<Arc<dyn OrderStore>, StartupError> {
    let url = config
        .database_url
        .as_deref()
        .ok_or(StartupError::MissingSetting("store.database_url"))?;
    let store = crate::store::PostgresOrderStore::connect(
        url,
        config.max_connections,
        Duration::from_secs(config.connect_timeout_secs),
    )
    .await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn connect_postgres(_config: &StoreConfig) -> Result<Arc<dyn OrderStore>, StartupError> {
    Err(StartupError::FeatureDisabled {
        backend: "postgres",
        feature: "postgres",
    })
}

async fn build_cache(
    config: &CacheConfig,
    shutdown: &Shutdown,
) -> Result<Arc<dyn OrderCache>, StartupError> {
    match config.backend {
        CacheBackend::Memory => {
            let cache = Arc::new(InMemoryCache::new());
            cache.clone().spawn_sweeper(
                Duration::from_secs(config.sweep_interval_secs),
                shutdown.subscribe(),
            );
            Ok(cache)
        }
        CacheBackend::Redis => connect_redis(config).await,
    }
}

#[cfg(feature = "redis")]
async fn connect_redis(config: &CacheConfig) -> Result<Arc<dyn OrderCache>, StartupError> {
    let url = config
        .redis_url
        .as_deref()
        .ok_or(StartupError::MissingSetting("cache.redis_url"))?;
    Ok(Arc::new(crate::cache::RedisCache::connect(url).await?))
}

#[cfg(not(feature = "redis"))]
async fn connect_redis(_config: &CacheConfig) -> Result<Arc<dyn OrderCache>, StartupError> {
    Err(StartupError::FeatureDisabled {
        backend: "redis",
        feature: "redis",
    })
}

fn build_publisher(
    config: &ServiceConfig,
    shutdown: &Shutdown,
) -> Result<Arc<dyn EventPublisher>, StartupError> {
    let events = &config.events;
    match events.backend {
        EventsBackend::Memory => {
            let publisher = Arc::new(InMemoryPublisher::new(events.buffer_size));
            if events.log_events {
                let logger = EventLogger::new(publisher.subscribe(), shutdown.subscribe());
                tokio::spawn(logger.run());
            }
            Ok(publisher)
        }
        EventsBackend::Kafka => connect_kafka(config),
    }
}

/// The producer's delivery timeout matches the per-attempt publish deadline.
#[cfg(feature = "kafka")]
fn kafka_publisher(
    config: &ServiceConfig,
) -> Result<crate::events::KafkaPublisher, StartupError> {
    let brokers = config
        .events
        .brokers
        .as_deref()
        .ok_or(StartupError::MissingSetting("events.brokers"))?;
    Ok(crate::events::KafkaPublisher::new(
        brokers,
        Duration::from_millis(config.resilience.publish_timeout_ms),
    )?)
}

#[cfg(feature = "kafka")]
fn connect_kafka(config: &ServiceConfig) -> Result<Arc<dyn EventPublisher>, StartupError> {
    Ok(Arc::new(kafka_publisher(config)?))
}

#[cfg(not(feature = "kafka"))]
fn connect_kafka(_config: &ServiceConfig) -> Result<Arc<dyn EventPublisher>, StartupError> {
    Err(StartupError::FeatureDisabled {
        backend: "kafka",
        feature: "kafka",
    })
}
