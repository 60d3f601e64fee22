//! The stock ledger: the single shared mutable resource of the core.
//!
//! All reads used for mutation decisions go through implementations of
//! `StockLedger`, which serialize them per record — via a per-record mutex
//! in memory, or conditional row updates in Postgres. No two concurrent
//! `reserve` calls on the same record can both succeed past the available
//! quantity; this is a strict at-most-available guarantee, not best-effort.

use thiserror::Error;

use storefront_catalog::VariantId;
use storefront_inventory::{ReserveOutcome, StockRecordId, StockSnapshot};

mod in_memory;
mod postgres;

pub use in_memory::InMemoryStockLedger;
pub use postgres::PostgresStockLedger;

/// Ledger operation error.
///
/// `Insufficient` is deliberately *not* here: losing a reservation race is
/// an expected outcome (`ReserveOutcome::Insufficient`), not an error.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The referenced stock record does not exist.
    #[error("stock record not found: {0}")]
    RecordNotFound(StockRecordId),

    /// A stock record is already registered under this id.
    #[error("stock record already registered: {0}")]
    DuplicateRecord(StockRecordId),

    /// Non-positive reserve/release amount. The planner never emits these;
    /// seeing one means a caller bypassed planning.
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    /// Conservation would be broken (e.g. release past allocated). Fatal to
    /// the operation in flight; never silently corrected.
    #[error("ledger invariant violated: {0}")]
    InvariantViolation(String),

    /// Backing store failure (lock poisoning, connection loss, ...).
    #[error("ledger storage error: {0}")]
    Storage(String),
}

/// Durable, per-record-atomic stock accounting.
///
/// Every successful `reserve`/`release` is an atomic state transition on
/// one record. Multi-record atomicity across a checkout is built on top by
/// the coordinator (two-phase reserve/commit-or-release).
pub trait StockLedger: Send + Sync {
    /// Sum of allocatable quantity across all records of the variant.
    /// Availability pre-check only; the authoritative check happens in
    /// `reserve`.
    fn total_allocatable(&self, variant: VariantId) -> Result<i64, LedgerError>;

    /// Snapshots of all records holding the variant, ascending record id.
    fn stock_for(&self, variant: VariantId) -> Result<Vec<StockSnapshot>, LedgerError>;

    /// Atomically check `allocatable >= amount` and move `amount` from
    /// allocatable to allocated. Returns `Insufficient` without mutating
    /// when the check fails.
    fn reserve(&self, record: StockRecordId, amount: i64) -> Result<ReserveOutcome, LedgerError>;

    /// Reverse a reservation (rollback path). Fails with
    /// `InvariantViolation` if allocated would go negative.
    fn release(&self, record: StockRecordId, amount: i64) -> Result<(), LedgerError>;
}
