use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_carts::CartLine;
use storefront_catalog::VariantId;
use storefront_core::{DomainError, Entity, EntityId, UserId};
use storefront_inventory::WarehouseId;

/// Order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub EntityId);

impl OrderId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Result of one successful (partial or full) allocation: this many units of
/// this variant, drawn from this warehouse. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    pub variant_id: VariantId,
    pub warehouse_id: WarehouseId,
    pub quantity: i64,
}

impl storefront_core::ValueObject for OrderLine {}

/// A placed order and its allocation lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    placed_at: DateTime<Utc>,
    lines: Vec<OrderLine>,
}

impl Order {
    /// Assemble an order from the cart lines that were requested and the
    /// allocation lines that were actually reserved.
    ///
    /// Enforces the checkout contract: per variant, the allocated quantities
    /// must sum to exactly the requested quantity — nothing missing, nothing
    /// extra, no variants the cart never asked for. Any mismatch rejects the
    /// whole order as an invariant violation.
    pub fn from_allocations(
        id: OrderId,
        user_id: UserId,
        placed_at: DateTime<Utc>,
        requested: &[CartLine],
        lines: Vec<OrderLine>,
    ) -> Result<Self, DomainError> {
        if requested.is_empty() {
            return Err(DomainError::validation("order must have at least one line"));
        }

        let mut allocated: BTreeMap<VariantId, i64> = BTreeMap::new();
        for line in &lines {
            if line.quantity <= 0 {
                return Err(DomainError::invariant(format!(
                    "order line {} has non-positive quantity {}",
                    line.line_no, line.quantity
                )));
            }
            *allocated.entry(line.variant_id).or_insert(0) += line.quantity;
        }

        for req in requested {
            match allocated.remove(&req.variant_id) {
                Some(sum) if sum == req.quantity => {}
                Some(sum) => {
                    return Err(DomainError::invariant(format!(
                        "variant {}: allocated {sum}, requested {}",
                        req.variant_id, req.quantity
                    )));
                }
                None => {
                    return Err(DomainError::invariant(format!(
                        "variant {}: no allocation for requested {}",
                        req.variant_id, req.quantity
                    )));
                }
            }
        }
        if let Some((variant, sum)) = allocated.into_iter().next() {
            return Err(DomainError::invariant(format!(
                "variant {variant}: allocated {sum} but never requested"
            )));
        }

        Ok(Self {
            id,
            user_id,
            placed_at,
            lines,
        })
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
