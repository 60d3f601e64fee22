//! Infrastructure: storage traits, their in-memory and Postgres
//! implementations, and the order commit coordinator.
//!
//! Domain crates stay pure; everything that locks, retries, persists or
//! rolls back lives here.

pub mod checkout;
pub mod ledger;
pub mod order_store;

#[cfg(test)]
mod integration_tests;

pub use checkout::{CheckoutCoordinator, CheckoutError, MAX_COMMIT_ATTEMPTS};
pub use ledger::{InMemoryStockLedger, LedgerError, PostgresStockLedger, StockLedger};
pub use order_store::{InMemoryOrderStore, OrderStore, OrderStoreError, PostgresOrderStore};
