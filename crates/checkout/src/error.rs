//! Fulfillment error taxonomy.

use common::OrderId;
use domain::{DomainError, OrderError, OrderStatus, ProductRef};
use thiserror::Error;

use crate::compensation::CompensationReport;

/// Errors reported by the fulfillment orchestrator.
///
/// The taxonomy distinguishes "nothing happened" (`EmptyCart`,
/// `InsufficientStock`, `PaymentFailed` before persistence) from
/// "something happened and was undone" (the same variants after a clean
/// rollback) from "something happened and partially could not be undone"
/// (`CompensationIncomplete`).
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The owner's cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Available stock is below the requested quantity.
    #[error("Insufficient stock for {product}")]
    InsufficientStock { product: ProductRef },

    /// The payment gateway rejected or failed the charge.
    #[error("Payment failed: {reason}")]
    PaymentFailed { reason: String },

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The requester is neither the owner nor an administrator.
    #[error("Not allowed to act on order {0}")]
    Forbidden(OrderId),

    /// The requested status transition is not allowed.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Compensation ran but one or more sub-steps failed; the report names
    /// exactly which.
    #[error("Compensation incomplete: {0}")]
    CompensationIncomplete(CompensationReport),

    /// Any other domain or store failure.
    #[error("Domain error: {0}")]
    Domain(DomainError),
}

impl From<DomainError> for FulfillmentError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::OrderNotFound(id) => FulfillmentError::OrderNotFound(id),
            DomainError::Order(OrderError::Forbidden { order }) => {
                FulfillmentError::Forbidden(order)
            }
            DomainError::Order(OrderError::InvalidTransition { from, to }) => {
                FulfillmentError::InvalidTransition { from, to }
            }
            other => FulfillmentError::Domain(other),
        }
    }
}

/// Convenience type alias for fulfillment results.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
