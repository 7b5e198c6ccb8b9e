//! In-process event transport over a broadcast channel.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::events::{EventPublisher, PublishError};

/// A message as it went out on the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub key: String,
    pub value: String,
}

/// Fans every published message out to all current subscribers.
///
/// Publishing with no subscribers succeeds; the message is simply dropped.
#[derive(Debug)]
pub struct InMemoryPublisher {
    tx: broadcast::Sender<PublishedMessage>,
    published: AtomicU64,
}

impl InMemoryPublisher {
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer_size.max(1));
        Self {
            tx,
            published: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedMessage> {
        self.tx.subscribe()
    }

    /// Messages accepted since startup.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl EventPublisher for InMemoryPublisher {
    async fn publish(&self, topic: &str, key: &str, value: &str) -> Result<(), PublishError> {
        let message = PublishedMessage {
            topic: topic.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        };
        let receivers = self.tx.send(message).unwrap_or(0);
        self.published.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(topic, key, receivers, "Event published");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
