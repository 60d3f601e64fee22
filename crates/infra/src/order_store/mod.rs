//! Order storage.
//!
//! Orders and their lines are inserted exactly once per successful
//! checkout, all-or-nothing; there is no update path. The coordinator
//! compensates (releases reservations) when an insert fails, so a failed
//! checkout leaves order storage unchanged.

use thiserror::Error;

use storefront_orders::{Order, OrderId};

mod in_memory;
mod postgres;

pub use in_memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;

/// Order store operation error.
#[derive(Debug, Error)]
pub enum OrderStoreError {
    /// An order with this id already exists (orders are created exactly
    /// once; a duplicate insert is a coordinator bug).
    #[error("order already exists: {0}")]
    Duplicate(OrderId),

    /// Backing store failure.
    #[error("order storage error: {0}")]
    Storage(String),
}

/// Append-only order persistence.
pub trait OrderStore: Send + Sync {
    /// Insert the order and all of its lines as one unit.
    fn insert(&self, order: &Order) -> Result<(), OrderStoreError>;

    /// Fetch a previously inserted order.
    fn get(&self, id: OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// Number of stored orders. Used by tests to assert no partial writes.
    fn count(&self) -> Result<u64, OrderStoreError>;
}
