//! Order entity, validation, and the service-level error taxonomy.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::cache::CacheError;
use crate::resilience::RetryError;
use crate::resilience::TimeoutError;
use crate::store::StoreError;

/// Opaque order identifier, assigned by the service on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Generate a fresh identifier (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OrderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Immutable once assigned.
    pub id: OrderId,
    /// Non-empty description of what was ordered.
    pub item: String,
    /// Always greater than zero for a stored order.
    pub quantity: u32,
}

impl Order {
    pub fn new(id: OrderId, item: impl Into<String>, quantity: u32) -> Self {
        Self {
            id,
            item: item.into(),
            quantity,
        }
    }
}

/// Largest quantity any store can hold (a signed 32-bit column).
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

/// Check the fields a caller may set on an order.
pub fn validate_order(item: &str, quantity: u32) -> OrderResult<()> {
    if item.is_empty() || quantity == 0 {
        return Err(OrderError::InvalidArgument(
            "item and quantity must not be empty".to_string(),
        ));
    }
    if quantity > MAX_QUANTITY {
        return Err(OrderError::InvalidArgument(format!(
            "quantity must not exceed {}",
            MAX_QUANTITY
        )));
    }
    Ok(())
}

/// Errors surfaced by the order service to its callers.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The request failed entity validation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No order exists for the id.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// Persistence failure.
    #[error("Store error: {0}")]
    Store(String),

    /// Cache transport or serialization failure (never a plain miss).
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// A deadline elapsed before the operation completed.
    #[error("Deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    /// Retries were exhausted.
    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for order operations.
pub type OrderResult<T> = Result<T, OrderError>;

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => OrderError::NotFound(id),
            StoreError::DeadlineExceeded(after) => OrderError::DeadlineExceeded(after),
            other => OrderError::Store(other.to_string()),
        }
    }
}

impl From<TimeoutError> for OrderError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::DeadlineExceeded(after) => OrderError::DeadlineExceeded(after),
            TimeoutError::Aborted(reason) => OrderError::OperationFailed(reason),
        }
    }
}

impl<E: fmt::Display> From<RetryError<E>> for OrderError {
    fn from(err: RetryError<E>) -> Self {
        OrderError::OperationFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = OrderId::generate();
        let b = OrderId::generate();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn test_validation() {
        assert!(validate_order("book", 1).is_ok());
        assert!(matches!(
            validate_order("", 1),
            Err(OrderError::InvalidArgument(_))
        ));
        assert!(matches!(
            validate_order("book", 0),
            Err(OrderError::InvalidArgument(_))
        ));
        assert!(validate_order("book", MAX_QUANTITY).is_ok());
        assert!(matches!(
            validate_order("book", MAX_QUANTITY + 1),
            Err(OrderError::InvalidArgument(msg)) if msg.contains("2147483647")
        ));
        assert!(matches!(
            validate_order("book", u32::MAX),
            Err(OrderError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_order_json_shape() {
        let order = Order::new(OrderId::from("k"), "X", 5);
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json, serde_json::json!({"id": "k", "item": "X", "quantity": 5}));
    }

    #[test]
    fn test_store_error_mapping() {
        let err: OrderError = StoreError::NotFound(OrderId::from("gone")).into();
        assert!(matches!(err, OrderError::NotFound(id) if id.as_str() == "gone"));

        let err: OrderError = StoreError::Backend("connection reset".into()).into();
        assert!(matches!(err, OrderError::Store(msg) if msg.contains("connection reset")));
    }

    #[test]
    fn test_error_display() {
        let err = OrderError::DeadlineExceeded(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Deadline exceeded after 250ms");
    }
}
