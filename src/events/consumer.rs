//! Event consumer that logs every published order event.

use tokio::sync::broadcast::{self, error::RecvError};

use crate::events::{OrderEvent, PublishedMessage};

/// Logs each message from the in-memory channel until shutdown.
pub struct EventLogger {
    rx: broadcast::Receiver<PublishedMessage>,
    shutdown: broadcast::Receiver<()>,
}

impl EventLogger {
    pub fn new(
        rx: broadcast::Receiver<PublishedMessage>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self { rx, shutdown }
    }

    /// Run until shutdown is signalled or the channel closes, logging any
    /// messages already queued first. Returns the number of messages seen.
    pub async fn run(mut self) -> u64 {
        let mut seen = 0;
        loop {
            // Queued events are logged before a pending shutdown is honoured.
            tokio::select! {
                biased;
                message = self.rx.recv() => match message {
                    Ok(message) => {
                        seen += 1;
                        log_message(&message);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Event logger fell behind, messages skipped");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = self.shutdown.recv() => {
                    tracing::debug!(seen, "Event logger stopping");
                    break;
                }
            }
        }
        seen
    }
}

fn log_message(message: &PublishedMessage) {
    match serde_json::from_str::<OrderEvent>(&message.value) {
        Ok(event) => tracing::info!(
            topic = %message.topic,
            order_id = %event.order.id,
            kind = ?event.kind,
            item = %event.order.item,
            quantity = event.order.quantity,
            "Order event"
        ),
        Err(err) => tracing::warn!(
            topic = %message.topic,
            key = %message.key,
            error = %err,
            "Undecodable event on channel"
        ),
    }
}
