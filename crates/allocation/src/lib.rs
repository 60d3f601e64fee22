//! Allocation domain module.
//!
//! The pure half of the stock allocation engine: given read-only stock
//! snapshots, decide which records to draw from and how much. Applying those
//! draws (locks, retries, rollback) is the coordinator's job in the infra
//! layer; nothing in this crate mutates anything.

pub mod checkout;
pub mod planner;

pub use checkout::CheckoutState;
pub use planner::{plan, AllocationPlan, Draw, PlanError};
