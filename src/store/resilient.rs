//! Store decorator applying the resilience primitives.
//!
//! # Responsibilities
//! - Bound every store call with a deadline
//! - Retry idempotent reads (`get`, `list`) on transient failures
//! - Leave `create`/`update`/`delete` single-shot: they are not safely
//!   repeatable once the first attempt may have landed

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::observability::metrics;
use crate::orders::{Order, OrderId};
use crate::resilience::{with_timeout, RetryError, RetryPolicy, TimeoutError};
use crate::store::{OrderStore, StoreError, StoreResult};

/// Wraps any [`OrderStore`] with deadlines and read retries.
pub struct ResilientStore {
    inner: Arc<dyn OrderStore>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ResilientStore {
    pub fn new(inner: Arc<dyn OrderStore>, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            inner,
            timeout,
            retry,
        }
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> StoreResult<T>
    where
        F: std::future::Future<Output = StoreResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let start = Instant::now();
        let result = match with_timeout(fut, self.timeout).await {
            Ok(result) => result,
            Err(TimeoutError::DeadlineExceeded(after)) => Err(StoreError::DeadlineExceeded(after)),
            Err(TimeoutError::Aborted(reason)) => Err(StoreError::Backend(reason)),
        };
        metrics::record_store_op(self.inner.backend_name(), op, result.is_ok(), start);
        result
    }

    async fn bounded_with_retry<T, F, Fut>(&self, op: &'static str, make: F) -> StoreResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = StoreResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.retry
            .run_if(|| self.bounded(op, make()), StoreError::is_transient)
            .await
            .map_err(|err| match err {
                RetryError::Failed { last, .. } => last,
                RetryError::NoAttempts => {
                    StoreError::Backend(format!("{} was not attempted: retry limit is zero", op))
                }
            })
    }
}

#[async_trait]
impl OrderStore for ResilientStore {
    async fn create(&self, order: Order) -> StoreResult<()> {
        let inner = self.inner.clone();
        self.bounded("create", async move { inner.create(order).await })
            .await
    }

    async fn get(&self, id: &OrderId) -> StoreResult<Order> {
        self.bounded_with_retry("get", || {
            let inner = self.inner.clone();
            let id = id.clone();
            async move { inner.get(&id).await }
        })
        .await
    }

    async fn update(&self, id: &OrderId, item: &str, quantity: u32) -> StoreResult<Order> {
        let inner = self.inner.clone();
        let id = id.clone();
        let item = item.to_string();
        self.bounded("update", async move { inner.update(&id, &item, quantity).await })
            .await
    }

    async fn delete(&self, id: &OrderId) -> StoreResult<()> {
        let inner = self.inner.clone();
        let id = id.clone();
        self.bounded("delete", async move { inner.delete(&id).await })
            .await
    }

    async fn list(&self) -> StoreResult<Vec<Order>> {
        self.bounded_with_retry("list", || {
            let inner = self.inner.clone();
            async move { inner.list().await }
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}
