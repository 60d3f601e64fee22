//! Greedy allocation planning.
//!
//! Candidate records are consumed in descending-allocatable order (ties
//! broken by ascending record id) so an order line touches as few distinct
//! warehouses as possible — fewer shipments per order. The plan is a pure
//! function of its snapshot input: identical snapshots produce identical
//! draw sequences.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront_catalog::VariantId;
use storefront_inventory::{StockRecordId, StockSnapshot, WarehouseId};

/// Planning failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// The variant's total allocatable stock cannot cover the request.
    /// Checked before anything is reserved, so a doomed request never
    /// partially allocates.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    /// The request itself is malformed (non-positive quantity).
    #[error("invalid requested quantity: {0}")]
    InvalidQuantity(i64),
}

/// One planned draw: take `amount` from `record_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub record_id: StockRecordId,
    pub warehouse_id: WarehouseId,
    pub amount: i64,
}

/// Ordered draw sequence covering one requested quantity of one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub variant_id: VariantId,
    pub requested: i64,
    pub draws: Vec<Draw>,
}

impl AllocationPlan {
    pub fn total_drawn(&self) -> i64 {
        self.draws.iter().map(|d| d.amount).sum()
    }
}

/// Plan draws for `requested` units of `variant` against the given
/// snapshots.
///
/// Snapshots for other variants are ignored; records with zero allocatable
/// are skipped and zero-amount draws are never emitted. Fails with
/// `InsufficientStock` (mutating nothing — there is nothing to mutate) when
/// the total available falls short.
pub fn plan(
    variant: VariantId,
    requested: i64,
    snapshots: &[StockSnapshot],
) -> Result<AllocationPlan, PlanError> {
    if requested <= 0 {
        return Err(PlanError::InvalidQuantity(requested));
    }

    let mut candidates: Vec<&StockSnapshot> = snapshots
        .iter()
        .filter(|s| s.variant_id == variant && s.allocatable > 0)
        .collect();

    let available: i64 = candidates.iter().map(|s| s.allocatable).sum();
    if available < requested {
        return Err(PlanError::InsufficientStock {
            requested,
            available,
        });
    }

    // Descending allocatable, ascending record id on ties.
    candidates.sort_by(|a, b| {
        b.allocatable
            .cmp(&a.allocatable)
            .then(a.record_id.cmp(&b.record_id))
    });

    let mut draws = Vec::new();
    let mut remaining = requested;
    for snap in candidates {
        if remaining == 0 {
            break;
        }
        let amount = remaining.min(snap.allocatable);
        draws.push(Draw {
            record_id: snap.record_id,
            warehouse_id: snap.warehouse_id,
            amount,
        });
        remaining -= amount;
    }

    Ok(AllocationPlan {
        variant_id: variant,
        requested,
        draws,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::EntityId;

    fn variant_id() -> VariantId {
        VariantId::new(EntityId::new())
    }

    fn snap(variant: VariantId, allocatable: i64) -> StockSnapshot {
        StockSnapshot {
            record_id: StockRecordId::new(EntityId::new()),
            variant_id: variant,
            warehouse_id: WarehouseId::new(EntityId::new()),
            allocatable,
        }
    }

    #[test]
    fn draws_descending_then_spills_over() {
        // Warehouse A: 5, warehouse B: 3. Request 7 -> 5 from A, 2 from B.
        let v = variant_id();
        let a = snap(v, 5);
        let b = snap(v, 3);

        let plan = plan(v, 7, &[b, a]).unwrap();
        assert_eq!(plan.draws.len(), 2);
        assert_eq!(plan.draws[0].record_id, a.record_id);
        assert_eq!(plan.draws[0].amount, 5);
        assert_eq!(plan.draws[1].record_id, b.record_id);
        assert_eq!(plan.draws[1].amount, 2);
        assert_eq!(plan.total_drawn(), 7);
    }

    #[test]
    fn over_request_fails_with_totals() {
        let v = variant_id();
        let snaps = [snap(v, 5), snap(v, 3)];

        let err = plan(v, 9, &snaps).unwrap_err();
        assert_eq!(
            err,
            PlanError::InsufficientStock {
                requested: 9,
                available: 8
            }
        );
    }

    #[test]
    fn single_record_covers_without_spill() {
        let v = variant_id();
        let snaps = [snap(v, 5), snap(v, 3)];
        let plan = plan(v, 4, &snaps).unwrap();
        assert_eq!(plan.draws.len(), 1);
        assert_eq!(plan.draws[0].amount, 4);
    }

    #[test]
    fn zero_allocatable_records_are_skipped() {
        let v = variant_id();
        let empty = snap(v, 0);
        let full = snap(v, 3);

        let plan = plan(v, 3, &[empty, full]).unwrap();
        assert_eq!(plan.draws.len(), 1);
        assert_eq!(plan.draws[0].record_id, full.record_id);
        assert!(plan.draws.iter().all(|d| d.amount > 0));
    }

    #[test]
    fn other_variants_do_not_count_as_available() {
        let v = variant_id();
        let other = variant_id();
        let snaps = [snap(v, 2), snap(other, 50)];

        let err = plan(v, 5, &snaps).unwrap_err();
        assert_eq!(
            err,
            PlanError::InsufficientStock {
                requested: 5,
                available: 2
            }
        );
    }

    #[test]
    fn equal_allocatable_ties_break_on_ascending_record_id() {
        let v = variant_id();
        let mut x = snap(v, 4);
        let mut y = snap(v, 4);
        // Force a known ordering between the two ids.
        if y.record_id < x.record_id {
            core::mem::swap(&mut x, &mut y);
        }

        let plan = plan(v, 6, &[y, x]).unwrap();
        assert_eq!(plan.draws[0].record_id, x.record_id);
        assert_eq!(plan.draws[0].amount, 4);
        assert_eq!(plan.draws[1].record_id, y.record_id);
        assert_eq!(plan.draws[1].amount, 2);
    }

    #[test]
    fn non_positive_request_is_rejected() {
        let v = variant_id();
        assert_eq!(plan(v, 0, &[]).unwrap_err(), PlanError::InvalidQuantity(0));
        assert_eq!(
            plan(v, -2, &[]).unwrap_err(),
            PlanError::InvalidQuantity(-2)
        );
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: planning is deterministic, covers the request
            /// exactly when it succeeds, and never over-draws a record.
            #[test]
            fn plan_is_deterministic_and_exact(
                requested in 1i64..=200,
                quantities in proptest::collection::vec(0i64..=50, 1..12)
            ) {
                let v = variant_id();
                let snapshots: Vec<StockSnapshot> =
                    quantities.into_iter().map(|q| snap(v, q)).collect();

                let first = plan(v, requested, &snapshots);
                let second = plan(v, requested, &snapshots);
                prop_assert_eq!(first.clone(), second);

                match first {
                    Ok(p) => {
                        prop_assert_eq!(p.total_drawn(), requested);
                        for d in &p.draws {
                            let source = snapshots
                                .iter()
                                .find(|s| s.record_id == d.record_id)
                                .unwrap();
                            prop_assert!(d.amount > 0);
                            prop_assert!(d.amount <= source.allocatable);
                        }
                    }
                    Err(PlanError::InsufficientStock { available, .. }) => {
                        prop_assert!(available < requested);
                    }
                    Err(other) => return Err(TestCaseError::fail(format!("{other:?}"))),
                }
            }
        }
    }
}
