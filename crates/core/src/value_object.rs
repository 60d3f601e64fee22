//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value** — they represent
/// concepts where identity doesn't matter, only the values do. To "modify" a
/// value object, create a new one with the new values.
///
/// Example:
/// - a stock snapshot `(record, allocatable)` is a value object
/// - a `StockRecord` with its own id is an entity
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
