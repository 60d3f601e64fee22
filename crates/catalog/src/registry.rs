//! Explicit catalog registry.
//!
//! The application builds one of these at process start and registers every
//! product and variant explicitly. No global mutable registry, no
//! reflection-based discovery: registration either creates an entry or
//! reports a conflict, and ambiguous states are errors.

use std::collections::HashMap;

use storefront_core::DomainError;

use crate::category::CategoryTree;
use crate::product::{Product, ProductId, ProductVariant, VariantId};

/// Outcome of a registration call. Tagged so callers can distinguish
/// first-time creation from an already-present entry instead of relying on
/// a silent get-or-create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
    Created,
    AlreadyPresent,
}

/// In-memory catalog: products, variants and the category tree.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    products: HashMap<ProductId, Product>,
    variants: HashMap<VariantId, ProductVariant>,
    categories: CategoryTree,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn categories(&self) -> &CategoryTree {
        &self.categories
    }

    pub fn categories_mut(&mut self) -> &mut CategoryTree {
        &mut self.categories
    }

    /// Register a product. Re-registering the same id with identical data is
    /// reported as `AlreadyPresent`; the same id with different data is a
    /// conflict (ambiguous state, never silently overwritten).
    pub fn register_product(&mut self, product: Product) -> Result<Registered, DomainError> {
        match self.products.get(&product.id_typed()) {
            None => {
                self.products.insert(product.id_typed(), product);
                Ok(Registered::Created)
            }
            Some(existing) if *existing == product => Ok(Registered::AlreadyPresent),
            Some(_) => Err(DomainError::conflict(format!(
                "product {} already registered with different data",
                product.id_typed()
            ))),
        }
    }

    /// Register a variant. The parent product must already be registered.
    pub fn register_variant(&mut self, variant: ProductVariant) -> Result<Registered, DomainError> {
        if !self.products.contains_key(&variant.product()) {
            return Err(DomainError::validation(format!(
                "variant {} references unregistered product {}",
                variant.id_typed(),
                variant.product()
            )));
        }
        match self.variants.get(&variant.id_typed()) {
            None => {
                self.variants.insert(variant.id_typed(), variant);
                Ok(Registered::Created)
            }
            Some(existing) if *existing == variant => Ok(Registered::AlreadyPresent),
            Some(_) => Err(DomainError::conflict(format!(
                "variant {} already registered with different data",
                variant.id_typed()
            ))),
        }
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    pub fn variant(&self, id: VariantId) -> Option<&ProductVariant> {
        self.variants.get(&id)
    }

    /// Variants of one product, sorted by id for deterministic listings.
    pub fn variants_of(&self, product: ProductId) -> Vec<&ProductVariant> {
        let mut out: Vec<&ProductVariant> = self
            .variants
            .values()
            .filter(|v| v.product() == product)
            .collect();
        out.sort_by_key(|v| v.id_typed());
        out
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::EntityId;

    fn product(name: &str) -> Product {
        Product::new(ProductId::new(EntityId::new()), name, None).unwrap()
    }

    #[test]
    fn registration_is_tagged_created_vs_present() {
        let mut catalog = Catalog::new();
        let p = product("Sencha");
        assert_eq!(
            catalog.register_product(p.clone()).unwrap(),
            Registered::Created
        );
        assert_eq!(
            catalog.register_product(p).unwrap(),
            Registered::AlreadyPresent
        );
    }

    #[test]
    fn conflicting_re_registration_fails() {
        let mut catalog = Catalog::new();
        let p = product("Sencha");
        catalog.register_product(p.clone()).unwrap();

        let conflicting = Product::new(p.id_typed(), "Matcha", None).unwrap();
        let err = catalog.register_product(conflicting).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn variant_requires_registered_product() {
        let mut catalog = Catalog::new();
        let orphan = ProductVariant::new(
            VariantId::new(EntityId::new()),
            ProductId::new(EntityId::new()),
            "500ml",
            420,
        )
        .unwrap();
        let err = catalog.register_variant(orphan).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn variants_of_lists_in_id_order() {
        let mut catalog = Catalog::new();
        let p = product("Sencha");
        let pid = p.id_typed();
        catalog.register_product(p).unwrap();

        let a = ProductVariant::new(VariantId::new(EntityId::new()), pid, "350ml", 300).unwrap();
        let b = ProductVariant::new(VariantId::new(EntityId::new()), pid, "500ml", 420).unwrap();
        catalog.register_variant(b.clone()).unwrap();
        catalog.register_variant(a.clone()).unwrap();

        let listed: Vec<VariantId> = catalog.variants_of(pid).iter().map(|v| v.id_typed()).collect();
        let mut expected = vec![a.id_typed(), b.id_typed()];
        expected.sort();
        assert_eq!(listed, expected);
    }
}
