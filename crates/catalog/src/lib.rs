//! Catalog domain module.
//!
//! Products, purchasable variants and the category hierarchy, plus the
//! explicit `Catalog` registry the application builds at startup. Pure
//! domain logic: no IO, no HTTP, no storage.

pub mod category;
pub mod product;
pub mod registry;
pub mod search;

pub use category::{Category, CategoryId, CategoryTree};
pub use product::{Product, ProductId, ProductVariant, VariantId};
pub use registry::{Catalog, Registered};
pub use search::split_keywords;
