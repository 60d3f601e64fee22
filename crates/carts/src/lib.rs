//! Cart domain module.
//!
//! Carts are owned by the surrounding application; this crate models them
//! only as far as the allocation core needs: ordered lines of
//! (variant, requested quantity) and a read-only snapshot of the lines that
//! actually need allocating.

pub mod cart;

pub use cart::{Cart, CartId, CartLine, LineChange};
