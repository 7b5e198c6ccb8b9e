//! Order management service library.
//!
//! Cache-aside reads and writes over a durable store, background event
//! notification, and the resilience primitives (retry, timeout, dead-letter
//! accumulation) that protect them.

// Core domain
pub mod cache;
pub mod events;
pub mod orders;
pub mod store;

// Outer surfaces
pub mod admin;
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use orders::{Order, OrderError, OrderId, OrderService};
