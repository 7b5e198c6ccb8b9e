use axum::{extract::State, response::IntoResponse, response::Response, Json};
use serde::Serialize;

use crate::cache::CacheStats;
use crate::events::OrderEvent;
use crate::http::server::AppState;
use crate::resilience::DeadLetter;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub store: &'static str,
    pub cache: &'static str,
    pub events: &'static str,
    pub topic: String,
    pub dead_letters: usize,
}

#[derive(Debug, Serialize)]
pub struct CacheStatus {
    pub backend: &'static str,
    pub ttl_secs: u64,
    /// Absent when the backend does not track statistics.
    pub stats: Option<CacheStats>,
    pub hit_rate: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DeadLetters {
    pub count: usize,
    pub capacity: usize,
    pub entries: Vec<DeadLetter<OrderEvent>>,
}

#[derive(Debug, Serialize)]
pub struct RedriveResult {
    pub redelivered: usize,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let service = &state.service;
    let notifier = service.notifier();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        store: service.store_backend(),
        cache: service.cache_backend(),
        events: notifier.publisher_name(),
        topic: notifier.topic().to_string(),
        dead_letters: notifier.dead_letters().len(),
    })
}

pub async fn get_cache(State(state): State<AppState>) -> Json<CacheStatus> {
    let stats = state.service.cache_stats();
    Json(CacheStatus {
        backend: state.service.cache_backend(),
        ttl_secs: state.service.policy().ttl.as_secs(),
        stats,
        hit_rate: stats.map(|s| s.hit_rate()),
    })
}

pub async fn get_dead_letters(State(state): State<AppState>) -> Json<DeadLetters> {
    let queue = state.service.notifier().dead_letters();
    let entries = queue.snapshot();
    Json(DeadLetters {
        count: entries.len(),
        capacity: queue.capacity(),
        entries,
    })
}

pub async fn redrive_dead_letters(State(state): State<AppState>) -> Response {
    match state.service.notifier().redrive().await {
        Ok(redelivered) => {
            tracing::info!(redelivered, "Dead letters redriven via admin API");
            Json(RedriveResult { redelivered }).into_response()
        }
        Err(err) => err.into_response(),
    }
}
