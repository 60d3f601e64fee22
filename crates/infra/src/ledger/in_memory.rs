use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};

use storefront_catalog::VariantId;
use storefront_core::DomainError;
use storefront_inventory::{ReserveOutcome, StockRecord, StockRecordId, StockSnapshot};

use super::{LedgerError, StockLedger};

/// In-memory stock ledger.
///
/// Intended for tests/dev and single-process deployments. A `BTreeMap`
/// keyed by record id keeps iteration (and therefore `stock_for` output) in
/// ascending id order; each record sits behind its own mutex so concurrent
/// reserves on different records do not contend, while reserves on the same
/// record are fully serialized.
#[derive(Debug, Default)]
pub struct InMemoryStockLedger {
    records: RwLock<BTreeMap<StockRecordId, Mutex<StockRecord>>>,
}

impl InMemoryStockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stock record. Restock/registration is an external
    /// operation; it is not part of the `StockLedger` contract.
    pub fn insert(&self, record: StockRecord) -> Result<(), LedgerError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| LedgerError::Storage("lock poisoned".to_string()))?;
        let id = record.id_typed();
        if records.contains_key(&id) {
            return Err(LedgerError::DuplicateRecord(id));
        }
        records.insert(id, Mutex::new(record));
        Ok(())
    }

    /// Snapshot every record in the ledger (ascending record id). Used by
    /// tests to assert that failed checkouts leave the ledger untouched.
    pub fn dump(&self) -> Result<Vec<StockRecord>, LedgerError> {
        let records = self
            .records
            .read()
            .map_err(|_| LedgerError::Storage("lock poisoned".to_string()))?;
        let mut out = Vec::with_capacity(records.len());
        for cell in records.values() {
            let rec = cell
                .lock()
                .map_err(|_| LedgerError::Storage("lock poisoned".to_string()))?;
            out.push(rec.clone());
        }
        Ok(out)
    }

    fn with_record<T>(
        &self,
        id: StockRecordId,
        f: impl FnOnce(&mut StockRecord) -> Result<T, DomainError>,
    ) -> Result<T, LedgerError> {
        let records = self
            .records
            .read()
            .map_err(|_| LedgerError::Storage("lock poisoned".to_string()))?;
        let cell = records.get(&id).ok_or(LedgerError::RecordNotFound(id))?;
        let mut rec = cell
            .lock()
            .map_err(|_| LedgerError::Storage("lock poisoned".to_string()))?;
        f(&mut rec).map_err(|e| match e {
            DomainError::InvariantViolation(msg) => LedgerError::InvariantViolation(msg),
            other => LedgerError::Storage(other.to_string()),
        })
    }
}

impl StockLedger for InMemoryStockLedger {
    fn total_allocatable(&self, variant: VariantId) -> Result<i64, LedgerError> {
        Ok(self
            .stock_for(variant)?
            .iter()
            .map(|s| s.allocatable)
            .sum())
    }

    fn stock_for(&self, variant: VariantId) -> Result<Vec<StockSnapshot>, LedgerError> {
        let records = self
            .records
            .read()
            .map_err(|_| LedgerError::Storage("lock poisoned".to_string()))?;
        let mut out = Vec::new();
        for cell in records.values() {
            let rec = cell
                .lock()
                .map_err(|_| LedgerError::Storage("lock poisoned".to_string()))?;
            if rec.variant() == variant {
                out.push(rec.snapshot());
            }
        }
        Ok(out)
    }

    fn reserve(&self, record: StockRecordId, amount: i64) -> Result<ReserveOutcome, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        self.with_record(record, |rec| rec.reserve(amount))
    }

    fn release(&self, record: StockRecordId, amount: i64) -> Result<(), LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        self.with_record(record, |rec| rec.release(amount))
    }
}
