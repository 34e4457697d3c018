//! Cart aggregate and store-backed cart service.

mod aggregate;
mod service;

pub use aggregate::{Cart, CartLine};
pub use service::{CartService, CartSnapshot};

use thiserror::Error;

use crate::value_objects::ProductRef;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// The merged line quantity would exceed the per-line cap.
    #[error("Quantity cap exceeded for {product}: requested {requested}, cap {cap}")]
    LineQuantityCap {
        product: ProductRef,
        requested: u32,
        cap: u32,
    },

    /// Line not found in cart.
    #[error("Line not found: {product}")]
    LineNotFound { product: ProductRef },
}
