//! Checkout attempt lifecycle.
//!
//! `Planning → Reserving → {Committed | RolledBack}`. The two terminal
//! states are the only ones observable outside the transaction boundary;
//! the coordinator uses the transition guards to make illegal jumps (e.g.
//! committing without reserving) programming errors instead of data bugs.

use serde::{Deserialize, Serialize};

use storefront_core::DomainError;

/// State of one checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    Planning,
    Reserving,
    Committed,
    RolledBack,
}

impl CheckoutState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }

    fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Planning, Self::Reserving)
                // A failed plan rolls back directly (nothing was reserved).
                | (Self::Planning, Self::RolledBack)
                | (Self::Reserving, Self::Committed)
                | (Self::Reserving, Self::RolledBack)
                // Race-lost reservations re-enter planning.
                | (Self::Reserving, Self::Planning)
        )
    }

    /// Transition to `next`, rejecting anything the lifecycle does not
    /// allow (including leaving a terminal state).
    pub fn transition(self, next: Self) -> Result<Self, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::invariant(format!(
                "illegal checkout transition {self:?} -> {next:?}"
            )))
        }
    }
}
