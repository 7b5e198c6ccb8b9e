//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Install the Prometheus exporter and its scrape endpoint
//! - Provide typed recording helpers so call sites never spell metric names
//!
//! # Metrics
//! - `orders_http_requests_total` (counter): requests by method, route, status
//! - `orders_http_request_duration_seconds` (histogram): request latency
//! - `orders_cache_lookups_total` (counter): cache lookups by outcome (hit, miss, error)
//! - `orders_store_operations_total` (counter): store calls by backend, operation, outcome
//! - `orders_store_operation_duration_seconds` (histogram): store call latency
//! - `orders_event_publish_total` (counter): event deliveries by outcome
//! - `orders_dead_letters` (gauge): current dead-letter queue depth
//!
//! Recording without an installed exporter is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use thiserror::Error;

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),

    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )
        .map_err(|e| MetricsError::Build(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    describe_metrics();
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

fn describe_metrics() {
    describe_counter!("orders_http_requests_total", "HTTP requests served");
    describe_histogram!(
        "orders_http_request_duration_seconds",
        "HTTP request latency"
    );
    describe_counter!("orders_cache_lookups_total", "Cache lookups by outcome");
    describe_counter!("orders_store_operations_total", "Store calls by outcome");
    describe_histogram!(
        "orders_store_operation_duration_seconds",
        "Store call latency"
    );
    describe_counter!("orders_event_publish_total", "Event deliveries by outcome");
    describe_gauge!("orders_dead_letters", "Events waiting in the dead-letter queue");
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    counter!(
        "orders_http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "orders_http_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Outcome of a single cache read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
    Error,
}

impl CacheOutcome {
    fn as_str(self) -> &'static str {
        match self {
            CacheOutcome::Hit => "hit",
            CacheOutcome::Miss => "miss",
            CacheOutcome::Error => "error",
        }
    }
}

pub fn record_cache_lookup(outcome: CacheOutcome) {
    counter!("orders_cache_lookups_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_store_op(backend: &'static str, op: &'static str, ok: bool, start: Instant) {
    let outcome = if ok { "ok" } else { "error" };
    counter!(
        "orders_store_operations_total",
        "backend" => backend,
        "op" => op,
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "orders_store_operation_duration_seconds",
        "backend" => backend,
        "op" => op
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_event_publish(ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    counter!("orders_event_publish_total", "outcome" => outcome).increment(1);
}

pub fn record_dead_letter_size(size: usize) {
    gauge!("orders_dead_letters").set(size as f64);
}
