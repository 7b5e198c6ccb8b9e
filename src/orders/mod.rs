//! Orders domain.
//!
//! # Data Flow
//! ```text
//! HTTP handler
//!     → service.rs (validate, cache-aside protocol, trigger notifier)
//!     → store (source of truth) / cache (disposable projection)
//! ```

pub mod service;
pub mod types;

pub use service::{CachePolicy, OrderService};
pub use types::{validate_order, Order, OrderError, OrderId, OrderResult};
