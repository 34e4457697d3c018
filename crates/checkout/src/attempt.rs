//! Per-call record of a checkout attempt.

use common::OrderId;
use docstore::Version;
use domain::ProductRef;
use uuid::Uuid;

use crate::services::{Charge, IdempotencyKey};

/// Phases of a single checkout attempt, in execution order.
///
/// ```text
/// Started ──► StockValidated ──► PaymentCharged ──► OrderPersisted
///                 ──► StockReserved ──► CartCleared ──► Committed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum AttemptPhase {
    /// Attempt created, nothing read or written yet.
    #[default]
    Started,

    /// Every cart line confirmed against available stock.
    StockValidated,

    /// The gateway charge is confirmed.
    PaymentCharged,

    /// The order document exists.
    OrderPersisted,

    /// Every line's stock is reserved.
    StockReserved,

    /// The cart has been emptied.
    CartCleared,

    /// The attempt finished; nothing left to roll back.
    Committed,
}

impl AttemptPhase {
    /// Returns true once side effects exist that a failure must undo.
    pub fn needs_rollback(&self) -> bool {
        *self >= AttemptPhase::PaymentCharged && *self < AttemptPhase::Committed
    }

    /// Returns the phase name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptPhase::Started => "started",
            AttemptPhase::StockValidated => "stock_validated",
            AttemptPhase::PaymentCharged => "payment_charged",
            AttemptPhase::OrderPersisted => "order_persisted",
            AttemptPhase::StockReserved => "stock_reserved",
            AttemptPhase::CartCleared => "cart_cleared",
            AttemptPhase::Committed => "committed",
        }
    }
}

impl std::fmt::Display for AttemptPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks one `place_order` call: how far it got and which side effects it
/// performed, so a failure rolls back exactly what this attempt did.
#[derive(Debug)]
pub struct CheckoutAttempt {
    id: Uuid,
    phase: AttemptPhase,
    charge: Option<Charge>,
    reservations: Vec<(ProductRef, u32)>,
    order: Option<(OrderId, Version)>,
}

impl CheckoutAttempt {
    /// Creates a new attempt in the `Started` phase.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: AttemptPhase::Started,
            charge: None,
            reservations: Vec::new(),
            order: None,
        }
    }

    /// Returns the attempt ID.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the current phase.
    pub fn phase(&self) -> AttemptPhase {
        self.phase
    }

    /// Returns the idempotency key for this attempt's charge.
    pub fn idempotency_key(&self) -> IdempotencyKey {
        IdempotencyKey::new(format!("checkout-{}", self.id))
    }

    /// Advances to a later phase.
    pub fn advance(&mut self, phase: AttemptPhase) {
        debug_assert!(phase > self.phase, "attempt phases only move forward");
        tracing::debug!(attempt_id = %self.id, phase = %phase, "attempt advanced");
        self.phase = phase;
    }

    /// Records the confirmed charge.
    pub fn record_charge(&mut self, charge: Charge) {
        self.charge = Some(charge);
    }

    /// Returns the charge, if one was taken.
    pub fn charge(&self) -> Option<&Charge> {
        self.charge.as_ref()
    }

    /// Records one successful stock reservation.
    pub fn record_reservation(&mut self, product: ProductRef, quantity: u32) {
        self.reservations.push((product, quantity));
    }

    /// Returns the reservations taken by this attempt.
    pub fn reservations(&self) -> &[(ProductRef, u32)] {
        &self.reservations
    }

    /// Records the persisted order and its stored version.
    pub fn record_order(&mut self, order_id: OrderId, version: Version) {
        self.order = Some((order_id, version));
    }

    /// Returns the persisted order reference, if any.
    pub fn order(&self) -> Option<(OrderId, Version)> {
        self.order
    }
}

impl Default for CheckoutAttempt {
    fn default() -> Self {
        Self::new()
    }
}
