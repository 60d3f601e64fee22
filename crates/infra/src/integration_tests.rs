//! Integration tests for the full checkout pipeline.
//!
//! Tests: Cart snapshot → Planner → StockLedger → CheckoutCoordinator → OrderStore
//!
//! Verifies:
//! - Successful commits allocate exactly the requested quantities
//! - Failed commits leave ledger and order storage identical to before
//! - Concurrent checkouts never oversell a record

use std::sync::Arc;

use storefront_carts::{Cart, CartId};
use storefront_catalog::VariantId;
use storefront_core::{EntityId, UserId};
use storefront_inventory::{StockRecord, StockRecordId, WarehouseId};

use crate::checkout::{CheckoutCoordinator, CheckoutError};
use crate::ledger::{InMemoryStockLedger, StockLedger};
use crate::order_store::{InMemoryOrderStore, OrderStore};

fn variant_id() -> VariantId {
    VariantId::new(EntityId::new())
}

fn record(variant: VariantId, allocatable: i64) -> StockRecord {
    StockRecord::new(
        StockRecordId::new(EntityId::new()),
        variant,
        WarehouseId::new(EntityId::new()),
        allocatable,
    )
    .unwrap()
}

fn setup() -> (
    Arc<InMemoryStockLedger>,
    Arc<InMemoryOrderStore>,
    CheckoutCoordinator<InMemoryStockLedger, InMemoryOrderStore>,
) {
    let ledger = Arc::new(InMemoryStockLedger::new());
    let orders = Arc::new(InMemoryOrderStore::new());
    let coordinator = CheckoutCoordinator::new(ledger.clone(), orders.clone());
    (ledger, orders, coordinator)
}

fn cart_with(lines: &[(VariantId, i64)]) -> Cart {
    let mut cart = Cart::new(CartId::new(EntityId::new()), UserId::new());
    for (v, q) in lines {
        cart.add(*v, *q).unwrap();
    }
    cart
}

#[test]
fn multi_line_checkout_allocates_each_line_exactly() {
    let (ledger, orders, coordinator) = setup();
    let tea = variant_id();
    let coffee = variant_id();
    // Tea split across two warehouses, coffee in one.
    ledger.insert(record(tea, 5)).unwrap();
    ledger.insert(record(tea, 3)).unwrap();
    ledger.insert(record(coffee, 10)).unwrap();

    let order = coordinator
        .commit(UserId::new(), &cart_with(&[(tea, 7), (coffee, 4)]))
        .unwrap();

    // 7 tea drawn 5 + 2 (descending allocatable), 4 coffee in one draw.
    let tea_total: i64 = order
        .lines()
        .iter()
        .filter(|l| l.variant_id == tea)
        .map(|l| l.quantity)
        .sum();
    assert_eq!(tea_total, 7);
    assert_eq!(order.lines().len(), 3);

    assert_eq!(ledger.total_allocatable(tea).unwrap(), 1);
    assert_eq!(ledger.total_allocatable(coffee).unwrap(), 6);
    assert_eq!(
        orders.get(order.id_typed()).unwrap().as_ref(),
        Some(&order)
    );
}

#[test]
fn one_short_line_aborts_the_whole_checkout() {
    let (ledger, orders, coordinator) = setup();
    let plenty = variant_id();
    let scarce = variant_id();
    ledger.insert(record(plenty, 100)).unwrap();
    ledger.insert(record(scarce, 1)).unwrap();

    let before = ledger.dump().unwrap();
    let err = coordinator
        .commit(UserId::new(), &cart_with(&[(plenty, 10), (scarce, 2)]))
        .unwrap_err();

    match err {
        CheckoutError::InsufficientStock {
            line_no,
            variant_id,
            requested,
            available,
        } => {
            assert_eq!(line_no, 2);
            assert_eq!(variant_id, scarce);
            assert_eq!(requested, 2);
            assert_eq!(available, 1);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // Byte-identical pre-call state: no reservation applied anywhere, no
    // order stored.
    assert_eq!(ledger.dump().unwrap(), before);
    assert_eq!(orders.count().unwrap(), 0);
}

#[test]
fn over_request_against_split_stock_mutates_nothing() {
    // Warehouse A: 5, warehouse B: 3 — request 9 > 8 total.
    let (ledger, orders, coordinator) = setup();
    let v = variant_id();
    ledger.insert(record(v, 5)).unwrap();
    ledger.insert(record(v, 3)).unwrap();

    let before = ledger.dump().unwrap();
    let err = coordinator
        .commit(UserId::new(), &cart_with(&[(v, 9)]))
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::InsufficientStock {
            requested: 9,
            available: 8,
            ..
        }
    ));
    assert_eq!(ledger.dump().unwrap(), before);
    assert_eq!(orders.count().unwrap(), 0);
}

#[test]
fn concurrent_commits_never_exceed_available_stock() {
    // N = 12 single-unit checkouts against K = 5 units: exactly 5 commit,
    // 7 fail with InsufficientStock, never more than 5.
    let (ledger, orders, coordinator) = setup();
    let v = variant_id();
    ledger.insert(record(v, 5)).unwrap();

    let coordinator = Arc::new(coordinator);
    let mut handles = Vec::new();
    for _ in 0..12 {
        let coordinator = coordinator.clone();
        handles.push(std::thread::spawn(move || {
            coordinator.commit(UserId::new(), &cart_with(&[(v, 1)]))
        }));
    }

    let mut committed = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => committed += 1,
            Err(CheckoutError::InsufficientStock { .. }) => insufficient += 1,
            Err(other) => panic!("unexpected checkout failure: {other:?}"),
        }
    }

    assert_eq!(committed, 5);
    assert_eq!(insufficient, 7);
    assert_eq!(ledger.total_allocatable(v).unwrap(), 0);
    assert_eq!(orders.count().unwrap(), 5);

    let dump = ledger.dump().unwrap();
    assert_eq!(dump[0].allocated(), 5);
    assert_eq!(dump[0].total(), 5);
}

#[test]
fn concurrent_overlapping_multi_record_checkouts_stay_consistent() {
    // Two variants, two records each; many checkouts touch both variants
    // so their reserve sets overlap. Whatever commits, conservation holds
    // and allocated never exceeds what orders account for.
    let (ledger, orders, coordinator) = setup();
    let v1 = variant_id();
    let v2 = variant_id();
    ledger.insert(record(v1, 6)).unwrap();
    ledger.insert(record(v1, 2)).unwrap();
    ledger.insert(record(v2, 4)).unwrap();
    ledger.insert(record(v2, 4)).unwrap();

    let coordinator = Arc::new(coordinator);
    let mut handles = Vec::new();
    for _ in 0..8 {
        let coordinator = coordinator.clone();
        handles.push(std::thread::spawn(move || {
            coordinator.commit(UserId::new(), &cart_with(&[(v1, 2), (v2, 2)]))
        }));
    }

    let committed = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|result| result.is_ok())
        .count() as i64;

    // v1 caps at 4 checkouts (8 units), v2 at 4 (8 units).
    assert!(committed <= 4);
    assert_eq!(orders.count().unwrap(), committed as u64);
    assert_eq!(ledger.total_allocatable(v1).unwrap(), 8 - 2 * committed);
    assert_eq!(ledger.total_allocatable(v2).unwrap(), 8 - 2 * committed);

    for rec in ledger.dump().unwrap() {
        assert!(rec.allocatable() >= 0);
        assert!(rec.allocated() >= 0);
    }
}

#[test]
fn committed_order_lines_sum_to_requested_per_variant() {
    let (ledger, _orders, coordinator) = setup();
    let v = variant_id();
    for allocatable in [4, 4, 4] {
        ledger.insert(record(v, allocatable)).unwrap();
    }

    let order = coordinator
        .commit(UserId::new(), &cart_with(&[(v, 10)]))
        .unwrap();
    let total: i64 = order.lines().iter().map(|l| l.quantity).sum();
    assert_eq!(total, 10);
    assert!(order.lines().iter().all(|l| l.quantity > 0));
    assert_eq!(ledger.total_allocatable(v).unwrap(), 2);
}
