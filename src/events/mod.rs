//! Order event notification subsystem.
//!
//! # Data Flow
//! ```text
//! OrderService (after a successful create/update)
//!     → notifier.rs (background task: retry × per-attempt timeout)
//!         → memory.rs (broadcast channel, default)
//!         → kafka.rs  (rdkafka producer, feature "kafka")
//!     → On final failure: dead-letter queue (inspect / redrive via admin API)
//!
//! consumer.rs: EventLogger subscribes to the in-memory channel and logs events
//! ```
//!
//! Publishing is best-effort. A failed publish never fails the request that
//! triggered it.

pub mod consumer;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod memory;
pub mod notifier;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::orders::Order;

pub use consumer::EventLogger;
#[cfg(feature = "kafka")]
pub use kafka::KafkaPublisher;
pub use memory::{InMemoryPublisher, PublishedMessage};
pub use notifier::EventNotifier;

#[derive(Debug, Clone, Error)]
pub enum PublishError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("publish exceeded deadline of {0:?}")]
    Timeout(Duration),

    #[error("failed to encode event: {0}")]
    Encode(String),
}

/// Sends keyed messages to a topic.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, value: &str) -> Result<(), PublishError>;

    fn backend_name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Created,
    Updated,
}

/// Message published for every order mutation that carries a new state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub kind: EventKind,
    pub order: Order,
}

impl OrderEvent {
    pub fn created(order: Order) -> Self {
        Self {
            kind: EventKind::Created,
            order,
        }
    }

    pub fn updated(order: Order) -> Self {
        Self {
            kind: EventKind::Updated,
            order,
        }
    }
}
