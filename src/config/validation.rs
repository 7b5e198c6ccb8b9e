//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that each selected backend has its connection settings
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! Every problem is reported, not just the first.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{CacheBackend, EventsBackend, ServiceConfig, StoreBackend};

/// A single semantic problem, tied to the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.store.backend == StoreBackend::Postgres {
        if is_blank(&config.store.database_url) {
            errors.push(ValidationError::new(
                "store.database_url",
                "required when store.backend = \"postgres\"",
            ));
        }
        if config.store.max_connections == 0 {
            errors.push(ValidationError::new("store.max_connections", "must be greater than 0"));
        }
    }

    if config.cache.backend == CacheBackend::Redis && is_blank(&config.cache.redis_url) {
        errors.push(ValidationError::new(
            "cache.redis_url",
            "required when cache.backend = \"redis\"",
        ));
    }
    if config.cache.ttl_secs == 0 {
        errors.push(ValidationError::new("cache.ttl_secs", "must be greater than 0"));
    }
    if config.cache.op_timeout_ms == 0 {
        errors.push(ValidationError::new("cache.op_timeout_ms", "must be greater than 0"));
    }
    if config.cache.backend == CacheBackend::Memory && config.cache.sweep_interval_secs == 0 {
        errors.push(ValidationError::new(
            "cache.sweep_interval_secs",
            "must be greater than 0",
        ));
    }

    if config.events.backend == EventsBackend::Kafka && is_blank(&config.events.brokers) {
        errors.push(ValidationError::new(
            "events.brokers",
            "required when events.backend = \"kafka\"",
        ));
    }
    if config.events.topic.is_empty() {
        errors.push(ValidationError::new("events.topic", "must not be empty"));
    }

    let resilience = &config.resilience;
    if resilience.store_timeout_ms == 0 {
        errors.push(ValidationError::new("resilience.store_timeout_ms", "must be greater than 0"));
    }
    if resilience.publish_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "resilience.publish_timeout_ms",
            "must be greater than 0",
        ));
    }
    if resilience.dead_letter_capacity == 0 {
        errors.push(ValidationError::new(
            "resilience.dead_letter_capacity",
            "must be greater than 0",
        ));
    }
    if resilience.retry.max_attempts == 0 {
        errors.push(ValidationError::new(
            "resilience.retry.max_attempts",
            "must allow at least one attempt",
        ));
    }
    if resilience.retry.max_delay_ms < resilience.retry.base_delay_ms {
        errors.push(ValidationError::new(
            "resilience.retry.max_delay_ms",
            "must not be smaller than base_delay_ms",
        ));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if config.admin.enabled
        && (config.admin.api_key.is_empty() || config.admin.api_key == "CHANGE_ME_IN_PRODUCTION")
    {
        errors.push(ValidationError::new(
            "admin.api_key",
            "must be set to a real secret when admin is enabled",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = ServiceConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.store.backend = StoreBackend::Postgres;
        config.cache.backend = CacheBackend::Redis;
        config.cache.ttl_secs = 0;
        config.resilience.retry.max_attempts = 0;
        config.admin.enabled = true;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "store.database_url",
                "cache.redis_url",
                "cache.ttl_secs",
                "resilience.retry.max_attempts",
                "admin.api_key",
            ]
        );
    }

    #[test]
    fn test_kafka_requires_brokers() {
        let mut config = ServiceConfig::default();
        config.events.backend = EventsBackend::Kafka;
        config.events.brokers = Some("  ".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "events.brokers: required when events.backend = \"kafka\"");
    }

    #[test]
    fn test_memory_cache_needs_a_sweep_interval() {
        let mut config = ServiceConfig::default();
        config.cache.sweep_interval_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "cache.sweep_interval_secs");
    }
}
