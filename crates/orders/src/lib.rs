//! Order domain module.
//!
//! Orders are created exactly once per successful checkout and own their
//! lines. Construction validates that the allocated quantities cover the
//! requested cart lines exactly; a mismatch means the coordinator (or the
//! ledger underneath it) is broken, never the user.

pub mod order;

pub use order::{Order, OrderId, OrderLine};
