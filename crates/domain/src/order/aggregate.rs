//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, OwnerId};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ChargeId, Money, ProductRef, ShippingAddress};

use super::{OrderError, OrderStatus};

/// An order line with its price frozen at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// The product purchased.
    pub product: ProductRef,

    /// Quantity purchased.
    pub quantity: u32,

    /// Unit price at the moment of purchase. Later catalog price changes
    /// never affect this value.
    pub unit_price: Money,
}

impl OrderLine {
    /// Creates a new order line.
    pub fn new(product: impl Into<ProductRef>, quantity: u32, unit_price: Money) -> Self {
        Self {
            product: product.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns the line extension (quantity × unit price).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Persisted record of how far a cancellation has progressed.
///
/// Each compensation sub-step is recorded when it succeeds, so a retried
/// cancellation resumes without double-applying refunds or stock releases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationProgress {
    /// Whether the charge has been refunded.
    pub refunded: bool,

    /// The refund reference, once issued.
    pub refund_id: Option<String>,

    /// Products whose quantities have been released back to stock.
    pub released: Vec<ProductRef>,

    /// When the cancellation was first attempted.
    pub started_at: DateTime<Utc>,
}

impl CancellationProgress {
    /// Creates a fresh progress record.
    pub fn new() -> Self {
        Self {
            refunded: false,
            refund_id: None,
            released: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Returns true if the given product's stock has been released.
    pub fn has_released(&self, product: &ProductRef) -> bool {
        self.released.contains(product)
    }
}

/// Order aggregate root.
///
/// The immutable record of a completed purchase. The total is computed once
/// at construction and never changes; lines carry the unit price at
/// purchase. Orders are never deleted, only transitioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    id: OrderId,

    /// Customer who placed the order.
    owner: OwnerId,

    /// Lines with price-at-purchase.
    lines: Vec<OrderLine>,

    /// Sum of line extensions, frozen at creation.
    total: Money,

    /// Shipping address snapshot taken at checkout.
    shipping_address: ShippingAddress,

    /// The charge backing this order.
    charge_id: ChargeId,

    /// The refund reference, set when the charge is refunded.
    refund_id: Option<String>,

    /// Current status.
    status: OrderStatus,

    /// Cancellation progress, present once a cancellation has started.
    cancellation: Option<CancellationProgress>,

    /// When the order was created.
    created_at: DateTime<Utc>,
}

// Construction
impl Order {
    /// Creates a new order in `processing` status.
    ///
    /// Validates the lines and computes the frozen total.
    pub fn new(
        id: OrderId,
        owner: OwnerId,
        lines: Vec<OrderLine>,
        shipping_address: ShippingAddress,
        charge_id: ChargeId,
    ) -> Result<Self, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::NoLines);
        }
        for line in &lines {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    quantity: line.quantity,
                });
            }
            if !line.unit_price.is_positive() {
                return Err(OrderError::InvalidPrice {
                    price: line.unit_price.cents(),
                });
            }
        }

        let total = lines
            .iter()
            .map(OrderLine::line_total)
            .fold(Money::zero(), |acc, m| acc + m);

        Ok(Self {
            id,
            owner,
            lines,
            total,
            shipping_address,
            charge_id,
            refund_id: None,
            status: OrderStatus::Processing,
            cancellation: None,
            created_at: Utc::now(),
        })
    }
}

// Query methods
impl Order {
    /// Returns the order ID.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the owning customer.
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Returns the order lines.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Returns the line for a product, if present.
    pub fn line(&self, product: &ProductRef) -> Option<&OrderLine> {
        self.lines.iter().find(|l| &l.product == product)
    }

    /// Returns the frozen order total.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Returns the shipping address snapshot.
    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    /// Returns the charge reference.
    pub fn charge_id(&self) -> &ChargeId {
        &self.charge_id
    }

    /// Returns the refund reference, if a refund was issued.
    pub fn refund_id(&self) -> Option<&str> {
        self.refund_id.as_deref()
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the cancellation progress, if a cancellation has started.
    pub fn cancellation(&self) -> Option<&CancellationProgress> {
        self.cancellation.as_ref()
    }

    /// Returns when the order was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns true if every line's stock has been released.
    pub fn stock_fully_released(&self) -> bool {
        match &self.cancellation {
            Some(progress) => self
                .lines
                .iter()
                .all(|l| progress.has_released(&l.product)),
            None => false,
        }
    }
}

// Mutation methods
impl Order {
    /// Transitions the order to a new status.
    pub fn transition(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Starts (or resumes) cancellation, returning the progress record.
    pub fn begin_cancellation(&mut self) -> &mut CancellationProgress {
        self.cancellation
            .get_or_insert_with(CancellationProgress::new)
    }

    /// Records a successful refund of this order's charge.
    pub fn record_refund(&mut self, refund_id: impl Into<String>) {
        let refund_id = refund_id.into();
        self.refund_id = Some(refund_id.clone());
        let progress = self.begin_cancellation();
        progress.refunded = true;
        progress.refund_id = Some(refund_id);
    }

    /// Records a successful stock release for one product.
    pub fn record_release(&mut self, product: ProductRef) {
        let progress = self.begin_cancellation();
        if !progress.has_released(&product) {
            progress.released.push(product);
        }
    }
}
