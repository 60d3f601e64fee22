use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, Entity, EntityId};

use crate::category::CategoryId;

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub EntityId);

impl ProductId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Product variant identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(pub EntityId);

impl VariantId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for VariantId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A product as listed in the catalog. Display-level grouping of variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    category: Option<CategoryId>,
    visible: bool,
}

impl Product {
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        category: Option<CategoryId>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            category,
            visible: true,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Option<CategoryId> {
        self.category
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A purchasable unit: one concrete configuration of a product.
///
/// Immutable once created. `unit_price` is a snapshot in currency minor
/// units; pricing computation happens outside this core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    id: VariantId,
    product: ProductId,
    name: String,
    /// Price in smallest currency unit (e.g., cents).
    unit_price: u64,
}

impl ProductVariant {
    pub fn new(
        id: VariantId,
        product: ProductId,
        name: impl Into<String>,
        unit_price: u64,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("variant name cannot be empty"));
        }
        if unit_price == 0 {
            return Err(DomainError::validation("unit price must be at least 1"));
        }
        Ok(Self {
            id,
            product,
            name,
            unit_price,
        })
    }

    pub fn id_typed(&self) -> VariantId {
        self.id
    }

    pub fn product(&self) -> ProductId {
        self.product
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }
}

impl Entity for ProductVariant {
    type Id = VariantId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
