use serde::{Deserialize, Serialize};

use storefront_catalog::VariantId;
use storefront_core::{DomainError, Entity, EntityId, UserId};

/// Cart identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartId(pub EntityId);

impl CartId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CartId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// One pending line: a variant and the quantity the user wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub variant_id: VariantId,
    pub quantity: i64,
}

impl storefront_core::ValueObject for CartLine {}

/// Outcome of adding a variant to a cart. Tagged so callers can tell a new
/// line from an accumulated one; no silent get-or-create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    /// A new line was inserted with the given quantity.
    Inserted,
    /// An existing line was found; `quantity` is the accumulated total.
    Accumulated { quantity: i64 },
}

/// A user's cart. Lines keep insertion order so checkout processing is
/// deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    id: CartId,
    user_id: UserId,
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(id: CartId, user_id: UserId) -> Self {
        Self {
            id,
            user_id,
            lines: Vec::new(),
        }
    }

    pub fn id_typed(&self) -> CartId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Add `quantity` of `variant` to the cart. Accumulates into an existing
    /// line when present, keeping that line's original position.
    pub fn add(&mut self, variant: VariantId, quantity: i64) -> Result<LineChange, DomainError> {
        if quantity <= 0 {
            return Err(DomainError::validation("cart quantity must be positive"));
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.variant_id == variant) {
            line.quantity += quantity;
            return Ok(LineChange::Accumulated {
                quantity: line.quantity,
            });
        }
        self.lines.push(CartLine {
            variant_id: variant,
            quantity,
        });
        Ok(LineChange::Inserted)
    }

    /// Set a line's quantity directly (0 empties the line but keeps its
    /// position, matching how storefront cart pages edit quantities).
    pub fn set_quantity(&mut self, variant: VariantId, quantity: i64) -> Result<(), DomainError> {
        if quantity < 0 {
            return Err(DomainError::validation("cart quantity cannot be negative"));
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.variant_id == variant)
            .ok_or(DomainError::NotFound)?;
        line.quantity = quantity;
        Ok(())
    }

    /// Read-only snapshot for checkout: insertion order preserved,
    /// zero-quantity lines excluded.
    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines
            .iter()
            .copied()
            .filter(|l| l.quantity > 0)
            .collect()
    }
}

impl Entity for Cart {
    type Id = CartId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
