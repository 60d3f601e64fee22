//! Postgres-backed order store.
//!
//! Expects `orders` and `order_lines` tables:
//!
//! ```sql
//! CREATE TABLE orders (
//!     id        UUID PRIMARY KEY,
//!     user_id   UUID NOT NULL,
//!     placed_at TIMESTAMPTZ NOT NULL
//! );
//! CREATE TABLE order_lines (
//!     order_id     UUID NOT NULL REFERENCES orders (id),
//!     line_no      INTEGER NOT NULL,
//!     variant_id   UUID NOT NULL,
//!     warehouse_id UUID NOT NULL,
//!     quantity     BIGINT NOT NULL CHECK (quantity > 0),
//!     PRIMARY KEY (order_id, line_no)
//! );
//! ```
//!
//! The order row and all line rows go in one SQL transaction: either the
//! whole order is stored or none of it is.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use storefront_carts::CartLine;
use storefront_catalog::VariantId;
use storefront_core::UserId;
use storefront_inventory::WarehouseId;
use storefront_orders::{Order, OrderId, OrderLine};

use super::{OrderStore, OrderStoreError};

pub struct PostgresOrderStore {
    pool: Arc<PgPool>,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    fn handle() -> Result<tokio::runtime::Handle, OrderStoreError> {
        tokio::runtime::Handle::try_current()
            .map_err(|e| OrderStoreError::Storage(format!("no tokio runtime: {e}")))
    }
}

impl OrderStore for PostgresOrderStore {
    fn insert(&self, order: &Order) -> Result<(), OrderStoreError> {
        let pool = self.pool.clone();
        let order = order.clone();
        Self::handle()?.block_on(async move {
            let mut tx = pool
                .begin()
                .await
                .map_err(|e| OrderStoreError::Storage(e.to_string()))?;

            let inserted =
                sqlx::query("INSERT INTO orders (id, user_id, placed_at) VALUES ($1, $2, $3) ON CONFLICT (id) DO NOTHING")
                    .bind(*order.id_typed().0.as_uuid())
                    .bind(*order.user_id().as_uuid())
                    .bind(order.placed_at())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| OrderStoreError::Storage(e.to_string()))?
                    .rows_affected();
            if inserted == 0 {
                return Err(OrderStoreError::Duplicate(order.id_typed()));
            }

            for line in order.lines() {
                sqlx::query(
                    r#"
                    INSERT INTO order_lines (order_id, line_no, variant_id, warehouse_id, quantity)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(*order.id_typed().0.as_uuid())
                .bind(line.line_no as i32)
                .bind(*line.variant_id.0.as_uuid())
                .bind(*line.warehouse_id.0.as_uuid())
                .bind(line.quantity)
                .execute(&mut *tx)
                .await
                .map_err(|e| OrderStoreError::Storage(e.to_string()))?;
            }

            tx.commit()
                .await
                .map_err(|e| OrderStoreError::Storage(e.to_string()))
        })
    }

    fn get(&self, id: OrderId) -> Result<Option<Order>, OrderStoreError> {
        let pool = self.pool.clone();
        let order_uuid = *id.0.as_uuid();
        Self::handle()?.block_on(async move {
            let header = sqlx::query("SELECT user_id, placed_at FROM orders WHERE id = $1")
                .bind(order_uuid)
                .fetch_optional(&*pool)
                .await
                .map_err(|e| OrderStoreError::Storage(e.to_string()))?;
            let Some(header) = header else {
                return Ok(None);
            };

            let rows = sqlx::query(
                r#"
                SELECT line_no, variant_id, warehouse_id, quantity
                FROM order_lines
                WHERE order_id = $1
                ORDER BY line_no
                "#,
            )
            .bind(order_uuid)
            .fetch_all(&*pool)
            .await
            .map_err(|e| OrderStoreError::Storage(e.to_string()))?;

            let lines: Vec<OrderLine> = rows
                .iter()
                .map(|row| OrderLine {
                    line_no: row.get::<i32, _>("line_no") as u32,
                    variant_id: VariantId::new(row.get::<Uuid, _>("variant_id").into()),
                    warehouse_id: WarehouseId::new(row.get::<Uuid, _>("warehouse_id").into()),
                    quantity: row.get::<i64, _>("quantity"),
                })
                .collect();

            // Rebuild the requested view from the stored lines; the sums
            // were validated at construction and the store is append-only.
            let mut requested: Vec<CartLine> = Vec::new();
            for line in &lines {
                match requested.iter_mut().find(|r| r.variant_id == line.variant_id) {
                    Some(r) => r.quantity += line.quantity,
                    None => requested.push(CartLine {
                        variant_id: line.variant_id,
                        quantity: line.quantity,
                    }),
                }
            }

            let order = Order::from_allocations(
                id,
                UserId::from_uuid(header.get::<Uuid, _>("user_id")),
                header.get::<DateTime<Utc>, _>("placed_at"),
                &requested,
                lines,
            )
            .map_err(|e| OrderStoreError::Storage(format!("corrupt order {id}: {e}")))?;

            Ok(Some(order))
        })
    }

    fn count(&self) -> Result<u64, OrderStoreError> {
        let pool = self.pool.clone();
        Self::handle()?.block_on(async move {
            let row = sqlx::query("SELECT COUNT(*) FROM orders")
                .fetch_one(&*pool)
                .await
                .map_err(|e| OrderStoreError::Storage(e.to_string()))?;
            Ok(row.get::<i64, _>(0) as u64)
        })
    }
}
