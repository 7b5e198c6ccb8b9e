//! Background event delivery with retry and dead letters.
//!
//! # Responsibilities
//! - Publish order events off the request path
//! - Bound each publish attempt with a deadline and retry with backoff
//! - Park events that still fail in a dead-letter queue
//! - Redeliver parked events on demand

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::events::{EventPublisher, OrderEvent, PublishError};
use crate::observability::metrics;
use crate::orders::{OrderError, OrderResult};
use crate::resilience::{
    process_with_dlq, with_timeout, DeadLetter, DeadLetterQueue, DeadLetterSink, RetryError,
    RetryPolicy, TimeoutError,
};

/// Hands order events to a publisher in the background.
///
/// Clones share the publisher and the dead-letter queue.
#[derive(Clone)]
pub struct EventNotifier {
    publisher: Arc<dyn EventPublisher>,
    topic: Arc<str>,
    retry: RetryPolicy,
    publish_timeout: Duration,
    dead_letters: DeadLetterQueue<OrderEvent>,
}

impl EventNotifier {
    pub fn new(
        publisher: Arc<dyn EventPublisher>,
        topic: impl Into<Arc<str>>,
        retry: RetryPolicy,
        publish_timeout: Duration,
        dead_letters: DeadLetterQueue<OrderEvent>,
    ) -> Self {
        Self {
            publisher,
            topic: topic.into(),
            retry,
            publish_timeout,
            dead_letters,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn publisher_name(&self) -> &'static str {
        self.publisher.backend_name()
    }

    pub fn dead_letters(&self) -> &DeadLetterQueue<OrderEvent> {
        &self.dead_letters
    }

    /// Deliver `event` on a spawned task.
    ///
    /// The returned handle may be dropped; delivery continues regardless.
    pub fn notify(&self, event: OrderEvent) -> JoinHandle<()> {
        let notifier = self.clone();
        tokio::spawn(async move {
            if let Err(err) = notifier.deliver(&event).await {
                tracing::error!(
                    order_id = %event.order.id,
                    attempts = err.attempts(),
                    error = %err,
                    "Event delivery failed, moving to dead-letter queue"
                );
                notifier
                    .dead_letters
                    .push(event, err.to_string(), err.attempts());
            }
        })
    }

    /// Publish `event` now, retrying per the notifier's policy.
    pub async fn deliver(&self, event: &OrderEvent) -> Result<(), RetryError<PublishError>> {
        let payload = serde_json::to_string(event).map_err(|e| RetryError::Failed {
            attempts: 0,
            last: PublishError::Encode(e.to_string()),
        })?;
        let key = event.order.id.to_string();

        let result = self
            .retry
            .run(|| {
                let publisher = Arc::clone(&self.publisher);
                let topic = Arc::clone(&self.topic);
                let key = key.clone();
                let payload = payload.clone();
                let deadline = self.publish_timeout;
                async move {
                    let publish = async move { publisher.publish(&topic, &key, &payload).await };
                    match with_timeout(publish, deadline).await {
                        Ok(result) => result,
                        Err(TimeoutError::DeadlineExceeded(after)) => Err(PublishError::Timeout(after)),
                        Err(TimeoutError::Aborted(reason)) => Err(PublishError::Transport(reason)),
                    }
                }
            })
            .await;

        metrics::record_event_publish(result.is_ok());
        result
    }

    /// Drain the dead-letter queue and deliver every parked event again.
    ///
    /// Events that fail again are parked anew. Returns how many were
    /// delivered, or the last delivery error if any failed.
    pub async fn redrive(&self) -> OrderResult<usize> {
        let parked: Vec<OrderEvent> = self
            .dead_letters
            .drain()
            .into_iter()
            .map(|letter: DeadLetter<OrderEvent>| letter.payload)
            .collect();
        let total = parked.len();

        let mut requeue = Requeue {
            queue: &self.dead_letters,
            attempts: self.retry.max_attempts,
            failed: 0,
        };
        let result = process_with_dlq(parked, |event| async move { self.deliver(&event).await }, &mut requeue).await;

        let delivered = total - requeue.failed;
        tracing::info!(total, delivered, "Dead-letter redrive finished");

        match result {
            Ok(()) => Ok(delivered),
            Err(err) => Err(OrderError::OperationFailed(format!(
                "{} of {} events failed redelivery: {}",
                total - delivered,
                total,
                err
            ))),
        }
    }
}

/// Re-parks events that failed during a redrive.
struct Requeue<'a> {
    queue: &'a DeadLetterQueue<OrderEvent>,
    attempts: u32,
    failed: usize,
}

impl DeadLetterSink<OrderEvent> for Requeue<'_> {
    fn push_dead_letter(&mut self, item: OrderEvent, error: String) {
        self.failed += 1;
        self.queue.push(item, error, self.attempts);
    }
}
