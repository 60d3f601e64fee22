//! Stock records: allocatable vs. allocated quantity per (variant, warehouse).
//!
//! `reserve` and `release` only ever move quantity between the two counters,
//! so `allocatable + allocated` is conserved by construction. Restock (which
//! does create quantity) is an external operation outside this core.

use serde::{Deserialize, Serialize};

use storefront_catalog::VariantId;
use storefront_core::{DomainError, Entity, EntityId};

use crate::warehouse::WarehouseId;

/// Stock record identifier. Ordered: multi-record operations acquire and
/// reserve records in ascending id order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockRecordId(pub EntityId);

impl StockRecordId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for StockRecordId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Outcome of an attempted reservation.
///
/// `Insufficient` is not an error: it is the signal a concurrent checkout
/// got there first (or the plan was stale) and the caller must re-plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    Reserved,
    Insufficient,
}

/// Read-only view of one stock record, as the planner consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub record_id: StockRecordId,
    pub variant_id: VariantId,
    pub warehouse_id: WarehouseId,
    pub allocatable: i64,
}

impl storefront_core::ValueObject for StockSnapshot {}

/// Inventory of one product variant at one warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    id: StockRecordId,
    variant: VariantId,
    warehouse: WarehouseId,
    allocatable: i64,
    allocated: i64,
}

impl StockRecord {
    pub fn new(
        id: StockRecordId,
        variant: VariantId,
        warehouse: WarehouseId,
        allocatable: i64,
    ) -> Result<Self, DomainError> {
        if allocatable < 0 {
            return Err(DomainError::validation(
                "allocatable quantity cannot be negative",
            ));
        }
        Ok(Self {
            id,
            variant,
            warehouse,
            allocatable,
            allocated: 0,
        })
    }

    pub fn id_typed(&self) -> StockRecordId {
        self.id
    }

    pub fn variant(&self) -> VariantId {
        self.variant
    }

    pub fn warehouse(&self) -> WarehouseId {
        self.warehouse
    }

    pub fn allocatable(&self) -> i64 {
        self.allocatable
    }

    pub fn allocated(&self) -> i64 {
        self.allocated
    }

    /// Conserved across any sequence of reserve/release calls.
    pub fn total(&self) -> i64 {
        self.allocatable + self.allocated
    }

    pub fn snapshot(&self) -> StockSnapshot {
        StockSnapshot {
            record_id: self.id,
            variant_id: self.variant,
            warehouse_id: self.warehouse,
            allocatable: self.allocatable,
        }
    }

    /// Move `amount` from allocatable to allocated if enough is available.
    ///
    /// On `Insufficient` the record is untouched. The caller is responsible
    /// for serializing concurrent calls on the same record.
    pub fn reserve(&mut self, amount: i64) -> Result<ReserveOutcome, DomainError> {
        if amount <= 0 {
            return Err(DomainError::validation(
                "reserve amount must be positive",
            ));
        }
        if self.allocatable < amount {
            return Ok(ReserveOutcome::Insufficient);
        }
        self.allocatable -= amount;
        self.allocated += amount;
        Ok(ReserveOutcome::Reserved)
    }

    /// Reverse of `reserve`, used on rollback. Driving allocated negative
    /// means a release without a matching reservation: data corruption,
    /// reported as an invariant violation and never silently corrected.
    pub fn release(&mut self, amount: i64) -> Result<(), DomainError> {
        if amount <= 0 {
            return Err(DomainError::validation(
                "release amount must be positive",
            ));
        }
        if self.allocated < amount {
            return Err(DomainError::invariant(format!(
                "release of {amount} would drive allocated ({}) negative on record {}",
                self.allocated, self.id
            )));
        }
        self.allocated -= amount;
        self.allocatable += amount;
        Ok(())
    }
}

impl Entity for StockRecord {
    type Id = StockRecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
