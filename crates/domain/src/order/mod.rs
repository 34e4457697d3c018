//! Order aggregate and related types.

mod aggregate;
mod service;
mod status;

pub use aggregate::{CancellationProgress, Order, OrderLine};
pub use service::OrderService;
pub use status::OrderStatus;

use common::OrderId;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order has no lines.
    #[error("Order has no lines")]
    NoLines,

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Invalid price.
    #[error("Invalid price: {price} (must be greater than 0)")]
    InvalidPrice { price: i64 },

    /// The requested status transition is not allowed.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The requester is neither the owner nor an administrator.
    #[error("Not allowed to act on order {order}")]
    Forbidden { order: OrderId },
}
