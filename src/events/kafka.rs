//! Kafka event transport.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;

use crate::events::{EventPublisher, PublishError};

/// Publishes through an `rdkafka` producer.
#[derive(Clone)]
pub struct KafkaPublisher {
    producer: FutureProducer,
    queue_timeout: Duration,
}

impl KafkaPublisher {
    pub fn new(brokers: &str, message_timeout: Duration) -> Result<Self, PublishError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", message_timeout.as_millis().to_string())
            .set("acks", "1")
            .create()
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        tracing::info!(brokers, "Kafka producer created");
        Ok(Self {
            producer,
            queue_timeout: message_timeout,
        })
    }

    pub fn message_timeout(&self) -> Duration {
        self.queue_timeout
    }
}

#[async_trait]
impl EventPublisher for KafkaPublisher {
    async fn publish(&self, topic: &str, key: &str, value: &str) -> Result<(), PublishError> {
        let record = FutureRecord::to(topic).key(key).payload(value);

        match self
            .producer
            .send(record, Timeout::After(self.queue_timeout))
            .await
        {
            Ok(_) => {
                tracing::debug!(topic, key, "Event delivered to kafka");
                Ok(())
            }
            Err((err, _)) => {
                tracing::error!(topic, key, error = %err, "Kafka delivery failed");
                Err(PublishError::Transport(err.to_string()))
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        "kafka"
    }
}
