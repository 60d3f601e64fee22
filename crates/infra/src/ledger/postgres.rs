//! Postgres-backed stock ledger.
//!
//! Expects a `stock_records` table:
//!
//! ```sql
//! CREATE TABLE stock_records (
//!     id            UUID PRIMARY KEY,
//!     variant_id    UUID NOT NULL,
//!     warehouse_id  UUID NOT NULL,
//!     allocatable   BIGINT NOT NULL CHECK (allocatable >= 0),
//!     allocated     BIGINT NOT NULL CHECK (allocated >= 0)
//! );
//! CREATE INDEX stock_records_variant_idx ON stock_records (variant_id, id);
//! ```
//!
//! `reserve`/`release` are single conditional UPDATEs, so the
//! check-and-move is atomic at row level (`SELECT ... FOR UPDATE`
//! equivalent) and concurrent checkouts can never both consume the same
//! allocatable quantity. The sync `StockLedger` trait is bridged onto the
//! current tokio runtime handle, as the other stores in this layer do.

use std::sync::Arc;

use sqlx::{PgPool, Row};
use uuid::Uuid;

use storefront_catalog::VariantId;
use storefront_inventory::{ReserveOutcome, StockRecordId, StockSnapshot, WarehouseId};

use super::{LedgerError, StockLedger};

pub struct PostgresStockLedger {
    pool: Arc<PgPool>,
}

impl PostgresStockLedger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    fn handle() -> Result<tokio::runtime::Handle, LedgerError> {
        tokio::runtime::Handle::try_current()
            .map_err(|e| LedgerError::Storage(format!("no tokio runtime: {e}")))
    }

    fn record_exists(&self, id: StockRecordId) -> Result<bool, LedgerError> {
        let pool = self.pool.clone();
        let record_uuid = *id.0.as_uuid();
        Self::handle()?.block_on(async move {
            let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM stock_records WHERE id = $1)")
                .bind(record_uuid)
                .fetch_one(&*pool)
                .await
                .map_err(|e| LedgerError::Storage(e.to_string()))?;
            Ok(row.get::<bool, _>(0))
        })
    }
}

impl StockLedger for PostgresStockLedger {
    fn total_allocatable(&self, variant: VariantId) -> Result<i64, LedgerError> {
        let pool = self.pool.clone();
        let variant_uuid = *variant.0.as_uuid();
        Self::handle()?.block_on(async move {
            let row = sqlx::query(
                "SELECT COALESCE(SUM(allocatable), 0)::BIGINT FROM stock_records WHERE variant_id = $1",
            )
            .bind(variant_uuid)
            .fetch_one(&*pool)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
            Ok(row.get::<i64, _>(0))
        })
    }

    fn stock_for(&self, variant: VariantId) -> Result<Vec<StockSnapshot>, LedgerError> {
        let pool = self.pool.clone();
        let variant_uuid = *variant.0.as_uuid();
        Self::handle()?.block_on(async move {
            let rows = sqlx::query(
                r#"
                SELECT id, variant_id, warehouse_id, allocatable
                FROM stock_records
                WHERE variant_id = $1
                ORDER BY id
                "#,
            )
            .bind(variant_uuid)
            .fetch_all(&*pool)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

            Ok(rows
                .into_iter()
                .map(|row| StockSnapshot {
                    record_id: StockRecordId::new(row.get::<Uuid, _>("id").into()),
                    variant_id: VariantId::new(row.get::<Uuid, _>("variant_id").into()),
                    warehouse_id: WarehouseId::new(row.get::<Uuid, _>("warehouse_id").into()),
                    allocatable: row.get::<i64, _>("allocatable"),
                })
                .collect())
        })
    }

    fn reserve(&self, record: StockRecordId, amount: i64) -> Result<ReserveOutcome, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let pool = self.pool.clone();
        let record_uuid = *record.0.as_uuid();
        let updated = Self::handle()?.block_on(async move {
            sqlx::query(
                r#"
                UPDATE stock_records
                SET allocatable = allocatable - $2,
                    allocated   = allocated + $2
                WHERE id = $1 AND allocatable >= $2
                "#,
            )
            .bind(record_uuid)
            .bind(amount)
            .execute(&*pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| LedgerError::Storage(e.to_string()))
        })?;

        if updated == 1 {
            return Ok(ReserveOutcome::Reserved);
        }
        if self.record_exists(record)? {
            Ok(ReserveOutcome::Insufficient)
        } else {
            Err(LedgerError::RecordNotFound(record))
        }
    }

    fn release(&self, record: StockRecordId, amount: i64) -> Result<(), LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let pool = self.pool.clone();
        let record_uuid = *record.0.as_uuid();
        let updated = Self::handle()?.block_on(async move {
            sqlx::query(
                r#"
                UPDATE stock_records
                SET allocatable = allocatable + $2,
                    allocated   = allocated - $2
                WHERE id = $1 AND allocated >= $2
                "#,
            )
            .bind(record_uuid)
            .bind(amount)
            .execute(&*pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| LedgerError::Storage(e.to_string()))
        })?;

        if updated == 1 {
            return Ok(());
        }
        if self.record_exists(record)? {
            Err(LedgerError::InvariantViolation(format!(
                "release of {amount} would drive allocated negative on record {record}"
            )))
        } else {
            Err(LedgerError::RecordNotFound(record))
        }
    }
}
