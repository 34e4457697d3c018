//! Domain error types.

use common::OrderId;
use docstore::StoreError;
use thiserror::Error;

use crate::cart::CartError;
use crate::order::OrderError;
use crate::value_objects::ProductRef;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the document store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An error occurred in the cart aggregate.
    #[error("Cart error: {0}")]
    Cart(CartError),

    /// An error occurred in the order aggregate.
    #[error("Order error: {0}")]
    Order(OrderError),

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The product has no catalog or stock record.
    #[error("Unknown product: {product}")]
    UnknownProduct { product: ProductRef },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<CartError> for DomainError {
    fn from(e: CartError) -> Self {
        DomainError::Cart(e)
    }
}

impl From<OrderError> for DomainError {
    fn from(e: OrderError) -> Self {
        DomainError::Order(e)
    }
}
