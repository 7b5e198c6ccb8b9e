//! PostgreSQL-backed order store.
//!
//! # Responsibilities
//! - Own a pooled connection to the database
//! - Bootstrap the schema on startup (idempotent)
//! - Translate row-level outcomes into `StoreError` (missing row → `NotFound`,
//!   unique violation → `AlreadyExists`)

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::orders::{Order, OrderId};
use crate::store::{OrderStore, StoreError, StoreResult};

const SCHEMA_STATEMENTS: [&str; 2] = [
    "CREATE SCHEMA IF NOT EXISTS order_service",
    "CREATE TABLE IF NOT EXISTS order_service.orders (
        id TEXT PRIMARY KEY,
        item TEXT NOT NULL CHECK (item <> ''),
        quantity INTEGER NOT NULL CHECK (quantity > 0)
    )",
];

type OrderRow = (String, String, i32);

/// Durable order store on a `sqlx` connection pool.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Connect, verify the connection and ensure the schema exists.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(backend)?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::info!(max_connections, "Connected to postgres");
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the schema and table if they are missing.
    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(backend)?;
        }
        Ok(())
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    tracing::error!(error = %err, "Postgres operation failed");
    StoreError::Backend(err.to_string())
}

fn to_order((id, item, quantity): OrderRow) -> StoreResult<Order> {
    let quantity = u32::try_from(quantity)
        .map_err(|_| StoreError::Backend(format!("order {} has invalid quantity {}", id, quantity)))?;
    Ok(Order::new(OrderId::from(id), item, quantity))
}

fn to_column(quantity: u32) -> StoreResult<i32> {
    i32::try_from(quantity)
        .map_err(|_| StoreError::Backend(format!("quantity {} exceeds column range", quantity)))
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create(&self, order: Order) -> StoreResult<()> {
        let quantity = to_column(order.quantity)?;
        let result = sqlx::query(
            "INSERT INTO order_service.orders (id, item, quantity) VALUES ($1, $2, $3)",
        )
        .bind(order.id.as_str())
        .bind(&order.item)
        .bind(quantity)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::AlreadyExists(order.id))
            }
            Err(err) => Err(backend(err)),
        }
    }

    async fn get(&self, id: &OrderId) -> StoreResult<Order> {
        let row: Option<OrderRow> = sqlx::query_as(
            "SELECT id, item, quantity FROM order_service.orders WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(to_order)
            .unwrap_or_else(|| Err(StoreError::NotFound(id.clone())))
    }

    async fn update(&self, id: &OrderId, item: &str, quantity: u32) -> StoreResult<Order> {
        let row: Option<OrderRow> = sqlx::query_as(
            "UPDATE order_service.orders SET item = $1, quantity = $2 WHERE id = $3 \
             RETURNING id, item, quantity",
        )
        .bind(item)
        .bind(to_column(quantity)?)
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(to_order)
            .unwrap_or_else(|| Err(StoreError::NotFound(id.clone())))
    }

    async fn delete(&self, id: &OrderId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM order_service.orders WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> =
            sqlx::query_as("SELECT id, item, quantity FROM order_service.orders")
                .fetch_all(&self.pool)
                .await
                .map_err(backend)?;

        rows.into_iter().map(to_order).collect()
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion() {
        let order = to_order(("k".into(), "X".into(), 5)).unwrap();
        assert_eq!(order, Order::new("k".into(), "X", 5));

        assert!(matches!(
            to_order(("k".into(), "X".into(), -1)),
            Err(StoreError::Backend(_))
        ));
    }

    #[test]
    fn test_quantity_column_range() {
        assert_eq!(to_column(9).unwrap(), 9);
        assert!(to_column(u32::MAX).is_err());
    }
}
