//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the order API, health and admin routes
//! - Wire up middleware (request id, tracing, timeout, metrics)
//! - Serve on a bound listener until shutdown is signalled

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{MatchedPath, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::setup_admin_router;
use crate::config::ServiceConfig;
use crate::http::handlers;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::orders::{OrderError, OrderService};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<OrderService>,
    pub config: Arc<ServiceConfig>,
}

/// HTTP server for the order API.
pub struct HttpServer {
    router: Router,
    config: Arc<ServiceConfig>,
}

impl HttpServer {
    pub fn new(config: Arc<ServiceConfig>, service: Arc<OrderService>) -> Self {
        let state = AppState {
            service,
            config: config.clone(),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route(
                "/v1/orders",
                get(handlers::list_orders).post(handlers::create_order),
            )
            .route(
                "/v1/orders/{id}",
                get(handlers::get_order)
                    .put(handlers::update_order)
                    .delete(handlers::delete_order),
            )
            .route("/health", get(handlers::health));

        if config.admin.enabled {
            router = router.merge(setup_admin_router(state.clone()));
        }

        let request_timeout = Duration::from_secs(config.timeouts.request_secs);
        router
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::GATEWAY_TIMEOUT,
                request_timeout,
            ))
            .layer(middleware::map_response_with_state(
                request_timeout,
                render_request_timeout,
            ))
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
                    .layer(propagate_request_id_layer()),
            )
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` is triggered, then drain.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            admin = self.config.admin.enabled,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

/// Give the empty 504 produced by the timeout layer the usual error body.
async fn render_request_timeout(State(limit): State<Duration>, response: Response) -> Response {
    let from_timeout_layer = response.status() == StatusCode::GATEWAY_TIMEOUT
        && !response.headers().contains_key(header::CONTENT_TYPE);
    if !from_timeout_layer {
        return response;
    }

    tracing::warn!(timeout = ?limit, "Request exceeded the server deadline");
    OrderError::DeadlineExceeded(limit).into_response()
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let method = request.method().to_string();

    let response = next.run(request).await;

    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}
