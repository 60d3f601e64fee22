use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, Entity, EntityId};

/// Warehouse identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WarehouseId(pub EntityId);

impl WarehouseId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for WarehouseId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Reference to an address owned by the external address book.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressId(pub EntityId);

impl core::fmt::Display for AddressId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A storage location holding stock records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    id: WarehouseId,
    name: String,
    address: AddressId,
    visible: bool,
}

impl Warehouse {
    pub fn new(
        id: WarehouseId,
        name: impl Into<String>,
        address: AddressId,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("warehouse name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            address,
            visible: true,
        })
    }

    pub fn id_typed(&self) -> WarehouseId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> AddressId {
        self.address
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Naive availability estimate for display: next day when shipping to
    /// the warehouse's own address, two days otherwise. Carrier-grade ETA
    /// computation is an external concern.
    pub fn estimated_available(&self, destination: AddressId, now: DateTime<Utc>) -> DateTime<Utc> {
        if destination == self.address {
            now + Duration::days(1)
        } else {
            now + Duration::days(2)
        }
    }
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
