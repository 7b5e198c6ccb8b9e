//! Order persistence subsystem.
//!
//! # Data Flow
//! ```text
//! OrderService
//!     → resilient.rs (optional: deadline on every call, retries on reads)
//!     → memory.rs   (RwLock<HashMap>, default)
//!     → postgres.rs (sqlx pool, feature "postgres")
//! ```
//!
//! The store is the source of truth. Implementations are chosen at startup
//! from `store.backend` and used through `Arc<dyn OrderStore>`.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod resilient;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::orders::{Order, OrderId};

pub use memory::InMemoryOrderStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresOrderStore;
pub use resilient::ResilientStore;

/// Errors reported by order stores.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error("order {0} already exists")]
    AlreadyExists(OrderId),

    /// Connectivity or I/O failure in the backing engine.
    #[error("backend failure: {0}")]
    Backend(String),

    #[error("store call exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

impl StoreError {
    /// Whether repeating the same call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Backend(_) | StoreError::DeadlineExceeded(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Capability contract every order store satisfies.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order. Fails with `AlreadyExists` on a duplicate id.
    async fn create(&self, order: Order) -> StoreResult<()>;

    async fn get(&self, id: &OrderId) -> StoreResult<Order>;

    /// Persist new fields for an existing order and return the stored record.
    async fn update(&self, id: &OrderId, item: &str, quantity: u32) -> StoreResult<Order>;

    async fn delete(&self, id: &OrderId) -> StoreResult<()>;

    /// All orders, in no particular order.
    async fn list(&self) -> StoreResult<Vec<Order>>;

    /// Short backend name for logs and the admin API.
    fn backend_name(&self) -> &'static str;
}
