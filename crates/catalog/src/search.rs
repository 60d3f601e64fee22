//! Keyword search over the catalog.
//!
//! Conjunctive substring matching on product names, optionally filtered to a
//! category subtree. Keywords are split on ASCII and ideographic spaces so
//! queries typed with a Japanese IME behave the same as ASCII ones.

use storefront_core::DomainError;

use crate::category::CategoryId;
use crate::product::Product;
use crate::registry::Catalog;

/// Split a raw query into keywords. Ideographic spaces (U+3000) are
/// normalized to ASCII spaces first; empty fragments are dropped.
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.replace('\u{3000}', " ")
        .split(' ')
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

impl Catalog {
    /// Visible products whose name contains every keyword, optionally
    /// restricted to products within `category` (subtree included).
    ///
    /// An empty keyword list matches nothing: a blank query should not dump
    /// the whole catalog.
    pub fn search(
        &self,
        keywords: &[String],
        category: Option<CategoryId>,
    ) -> Result<Vec<&Product>, DomainError> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits = Vec::new();
        for product in self.products() {
            if !product.is_visible() {
                continue;
            }
            if !keywords.iter().all(|kw| product.name().contains(kw.as_str())) {
                continue;
            }
            if let Some(wanted) = category {
                match product.category() {
                    Some(cat) if self.categories().is_within(cat, wanted)? => {}
                    _ => continue,
                }
            }
            hits.push(product);
        }

        // Deterministic result order regardless of map iteration order.
        hits.sort_by_key(|p| p.id_typed());
        Ok(hits)
    }
}
