//! Order commit coordinator.
//!
//! Drives one checkout: plan every cart line, apply all reservations as one
//! logical unit, persist the order — or roll everything back. Multi-record
//! atomicity uses a two-phase reserve/commit-or-release protocol: records
//! are reserved in ascending record-id order (fixed across all checkouts,
//! so overlapping checkouts cannot deadlock), and any failure releases every
//! reservation already applied before the error crosses this boundary.
//!
//! A reservation lost to a concurrent checkout re-enters planning against
//! fresh ledger state; retries are capped so latency stays bounded under
//! contention, after which the failure surfaces as insufficient stock.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use storefront_allocation::{plan, AllocationPlan, CheckoutState, Draw, PlanError};
use storefront_carts::{Cart, CartLine};
use storefront_catalog::VariantId;
use storefront_core::{EntityId, UserId};
use storefront_inventory::ReserveOutcome;
use storefront_orders::{Order, OrderId, OrderLine};

use crate::ledger::{LedgerError, StockLedger};
use crate::order_store::{OrderStore, OrderStoreError};

/// Total attempts per checkout (first try + race retries).
pub const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Failure surfaced by `commit`. Rollback of all applied reservations is
/// guaranteed before any of these is returned; no partial order or partial
/// allocation is ever observable.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A cart line cannot be covered by current allocatable stock.
    /// Recoverable: the user can lower the quantity or retry later.
    #[error(
        "insufficient stock for line {line_no} (variant {variant_id}): requested {requested}, available {available}"
    )]
    InsufficientStock {
        line_no: u32,
        variant_id: VariantId,
        requested: i64,
        available: i64,
    },

    /// The checkout request itself is unusable (empty cart, bad quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A conservation or protocol invariant broke mid-checkout. This is a
    /// programming or data-corruption fault: fatal to the checkout, logged,
    /// never silently corrected.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Ledger or order storage failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<LedgerError> for CheckoutError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvariantViolation(msg) => CheckoutError::InvariantViolation(msg),
            LedgerError::InvalidAmount(n) => {
                // The planner never emits non-positive draws.
                CheckoutError::InvariantViolation(format!("planned draw with invalid amount {n}"))
            }
            other => CheckoutError::Storage(other.to_string()),
        }
    }
}

impl From<OrderStoreError> for CheckoutError {
    fn from(err: OrderStoreError) -> Self {
        match err {
            // Order ids are minted per checkout; a collision is a bug.
            OrderStoreError::Duplicate(id) => {
                CheckoutError::InvariantViolation(format!("duplicate order id {id}"))
            }
            OrderStoreError::Storage(msg) => CheckoutError::Storage(msg),
        }
    }
}

enum AttemptOutcome {
    Committed(Order),
    /// A planned reservation came back `Insufficient`: another checkout
    /// consumed the stock between plan and reserve. Everything applied so
    /// far has been released.
    RaceLost { variant_id: VariantId },
}

/// Coordinates checkout commits over a stock ledger and an order store.
pub struct CheckoutCoordinator<L: StockLedger, O: OrderStore> {
    ledger: Arc<L>,
    orders: Arc<O>,
}

impl<L: StockLedger, O: OrderStore> CheckoutCoordinator<L, O> {
    pub fn new(ledger: Arc<L>, orders: Arc<O>) -> Self {
        Self { ledger, orders }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn orders(&self) -> &O {
        &self.orders
    }

    /// Convert the cart's lines into a committed order, or fail with no
    /// observable mutation.
    pub fn commit(&self, user_id: UserId, cart: &Cart) -> Result<Order, CheckoutError> {
        let lines = cart.snapshot();
        if lines.is_empty() {
            return Err(CheckoutError::Validation(
                "cart has no allocatable lines".to_string(),
            ));
        }

        let mut state = CheckoutState::Planning;
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.attempt(user_id, &lines, &mut state)? {
                AttemptOutcome::Committed(order) => {
                    info!(
                        order_id = %order.id_typed(),
                        user_id = %user_id,
                        attempt,
                        lines = order.lines().len(),
                        "checkout committed"
                    );
                    return Ok(order);
                }
                AttemptOutcome::RaceLost { variant_id } => {
                    if attempt >= MAX_COMMIT_ATTEMPTS {
                        state = transition(state, CheckoutState::RolledBack)?;
                        debug_assert!(state.is_terminal());
                        warn!(
                            %variant_id,
                            attempt,
                            "reservation races exhausted the retry budget"
                        );
                        let (line_no, requested) = line_for(&lines, variant_id);
                        let available = self.ledger.total_allocatable(variant_id)?;
                        return Err(CheckoutError::InsufficientStock {
                            line_no,
                            variant_id,
                            requested,
                            available,
                        });
                    }
                    debug!(%variant_id, attempt, "reservation race lost; re-planning");
                    state = transition(state, CheckoutState::Planning)?;
                }
            }
        }
    }

    /// One full pass: plan, reserve, persist. On every failure path all
    /// applied reservations are released before returning.
    fn attempt(
        &self,
        user_id: UserId,
        lines: &[CartLine],
        state: &mut CheckoutState,
    ) -> Result<AttemptOutcome, CheckoutError> {
        let mut plans: Vec<AllocationPlan> = Vec::with_capacity(lines.len());
        for (idx, line) in lines.iter().enumerate() {
            let snapshots = self.ledger.stock_for(line.variant_id)?;
            match plan(line.variant_id, line.quantity, &snapshots) {
                Ok(p) => plans.push(p),
                Err(PlanError::InsufficientStock {
                    requested,
                    available,
                }) => {
                    // Nothing reserved yet: abort the whole checkout,
                    // naming the line that fell short.
                    *state = transition(*state, CheckoutState::RolledBack)?;
                    return Err(CheckoutError::InsufficientStock {
                        line_no: (idx + 1) as u32,
                        variant_id: line.variant_id,
                        requested,
                        available,
                    });
                }
                Err(PlanError::InvalidQuantity(q)) => {
                    *state = transition(*state, CheckoutState::RolledBack)?;
                    return Err(CheckoutError::Validation(format!(
                        "line {}: invalid quantity {q}",
                        idx + 1
                    )));
                }
            }
        }

        *state = transition(*state, CheckoutState::Reserving)?;

        // Reserve in ascending record-id order across all lines.
        let mut draws: Vec<(VariantId, Draw)> = plans
            .iter()
            .flat_map(|p| p.draws.iter().map(move |d| (p.variant_id, *d)))
            .collect();
        draws.sort_by_key(|(_, d)| d.record_id);

        let mut applied: Vec<Draw> = Vec::with_capacity(draws.len());
        for (variant_id, draw) in &draws {
            match self.ledger.reserve(draw.record_id, draw.amount) {
                Ok(ReserveOutcome::Reserved) => applied.push(*draw),
                Ok(ReserveOutcome::Insufficient) => {
                    self.rollback(&applied)?;
                    return Ok(AttemptOutcome::RaceLost {
                        variant_id: *variant_id,
                    });
                }
                Err(e) => {
                    self.rollback(&applied)?;
                    *state = transition(*state, CheckoutState::RolledBack)?;
                    return Err(e.into());
                }
            }
        }

        // Order lines follow cart-line order, then each plan's draw order.
        let mut order_lines = Vec::with_capacity(applied.len());
        let mut line_no = 0u32;
        for p in &plans {
            for d in &p.draws {
                line_no += 1;
                order_lines.push(OrderLine {
                    line_no,
                    variant_id: p.variant_id,
                    warehouse_id: d.warehouse_id,
                    quantity: d.amount,
                });
            }
        }

        let order = match Order::from_allocations(
            OrderId::new(EntityId::new()),
            user_id,
            Utc::now(),
            lines,
            order_lines,
        ) {
            Ok(order) => order,
            Err(e) => {
                error!(error = %e, "order assembly violated the allocation contract");
                self.rollback(&applied)?;
                *state = transition(*state, CheckoutState::RolledBack)?;
                return Err(CheckoutError::InvariantViolation(e.to_string()));
            }
        };

        if let Err(e) = self.orders.insert(&order) {
            self.rollback(&applied)?;
            *state = transition(*state, CheckoutState::RolledBack)?;
            return Err(e.into());
        }

        *state = transition(*state, CheckoutState::Committed)?;
        Ok(AttemptOutcome::Committed(order))
    }

    /// Release applied reservations in reverse order. A failed release means
    /// the ledger no longer matches what this checkout reserved: fatal.
    fn rollback(&self, applied: &[Draw]) -> Result<(), CheckoutError> {
        for draw in applied.iter().rev() {
            if let Err(e) = self.ledger.release(draw.record_id, draw.amount) {
                error!(
                    record_id = %draw.record_id,
                    amount = draw.amount,
                    error = %e,
                    "rollback release failed; ledger state is suspect"
                );
                return Err(CheckoutError::InvariantViolation(e.to_string()));
            }
        }
        Ok(())
    }
}

fn transition(state: CheckoutState, next: CheckoutState) -> Result<CheckoutState, CheckoutError> {
    state
        .transition(next)
        .map_err(|e| CheckoutError::InvariantViolation(e.to_string()))
}

fn line_for(lines: &[CartLine], variant_id: VariantId) -> (u32, i64) {
    lines
        .iter()
        .enumerate()
        .find(|(_, l)| l.variant_id == variant_id)
        .map(|(idx, l)| ((idx + 1) as u32, l.quantity))
        .unwrap_or((0, 0))
}
