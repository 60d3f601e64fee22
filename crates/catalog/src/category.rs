//! Category hierarchy.
//!
//! Represented as a flat id -> node table with parent ids, not an owned
//! tree: no ownership cycle, and traversal is an iterative walk with a
//! cycle guard. A cycle in the stored data is a data-corruption fault and
//! reported as an invariant violation.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, Entity, EntityId};

/// Category identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub EntityId);

impl CategoryId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A single category node. `parent` is an id relation, never a reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    id: CategoryId,
    name: String,
    parent: Option<CategoryId>,
    visible: bool,
}

impl Category {
    pub fn new(
        id: CategoryId,
        name: impl Into<String>,
        parent: Option<CategoryId>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("category name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            parent,
            visible: true,
        })
    }

    pub fn id_typed(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<CategoryId> {
        self.parent
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Lookup table over all registered categories.
#[derive(Debug, Default, Clone)]
pub struct CategoryTree {
    nodes: HashMap<CategoryId, Category>,
}

impl CategoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a category. The parent, if any, must already be registered;
    /// duplicate ids are a conflict.
    pub fn insert(&mut self, category: Category) -> Result<(), DomainError> {
        if self.nodes.contains_key(&category.id) {
            return Err(DomainError::conflict(format!(
                "category {} already registered",
                category.id
            )));
        }
        if let Some(parent) = category.parent {
            if !self.nodes.contains_key(&parent) {
                return Err(DomainError::validation(format!(
                    "parent category {parent} is not registered"
                )));
            }
        }
        self.nodes.insert(category.id, category);
        Ok(())
    }

    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walk from `id` to the root, returning the ancestor chain
    /// (nearest parent first, `id` itself excluded).
    ///
    /// Iterative with a visited set: a parent cycle in the stored data is
    /// reported as `InvariantViolation` instead of looping forever.
    pub fn ancestors(&self, id: CategoryId) -> Result<Vec<CategoryId>, DomainError> {
        let mut seen: HashSet<CategoryId> = HashSet::new();
        seen.insert(id);

        let mut chain = Vec::new();
        let mut current = self
            .nodes
            .get(&id)
            .ok_or(DomainError::NotFound)?
            .parent;

        while let Some(parent_id) = current {
            if !seen.insert(parent_id) {
                return Err(DomainError::invariant(format!(
                    "category parent cycle detected at {parent_id}"
                )));
            }
            chain.push(parent_id);
            current = self
                .nodes
                .get(&parent_id)
                .ok_or(DomainError::NotFound)?
                .parent;
        }

        Ok(chain)
    }

    /// True if `id` equals `ancestor` or has it anywhere up its parent chain.
    pub fn is_within(&self, id: CategoryId, ancestor: CategoryId) -> Result<bool, DomainError> {
        if id == ancestor {
            return Ok(true);
        }
        Ok(self.ancestors(id)?.contains(&ancestor))
    }
}
