//! Inventory domain module.
//!
//! Warehouses and per-(variant, warehouse) stock records. Stock mutation is
//! expressed as pure state transitions on `StockRecord`; serializing those
//! transitions (locks, transactions) is the storage layer's job.

pub mod stock;
pub mod warehouse;

pub use stock::{ReserveOutcome, StockRecord, StockRecordId, StockSnapshot};
pub use warehouse::{AddressId, Warehouse, WarehouseId};
