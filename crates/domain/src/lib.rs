//! Domain layer for the commerce backend.
//!
//! This crate provides the aggregates and services the fulfillment core is
//! built from:
//! - Cart aggregate and store-backed cart service
//! - Inventory ledger with atomic reserve/release
//! - Product catalog reader (the price source for checkout)
//! - Order aggregate with its status machine

pub mod cart;
pub mod catalog;
pub mod error;
pub mod inventory;
pub mod order;
pub mod value_objects;

pub use cart::{Cart, CartError, CartLine, CartService, CartSnapshot};
pub use catalog::{Catalog, ProductRecord};
pub use error::DomainError;
pub use inventory::{InventoryLedger, ReserveOutcome, StockRecord};
pub use order::{
    CancellationProgress, Order, OrderError, OrderLine, OrderService, OrderStatus,
};
pub use value_objects::{ChargeId, MAX_LINE_QUANTITY, Money, ProductRef, ShippingAddress};

/// Document collection names used by the domain services.
pub mod collections {
    /// One cart document per owner, keyed by owner ID.
    pub const CARTS: &str = "carts";
    /// One order document per order, keyed by order ID.
    pub const ORDERS: &str = "orders";
    /// One stock record per product, keyed by product reference.
    pub const INVENTORY: &str = "inventory";
    /// One catalog record per product, keyed by product reference.
    pub const PRODUCTS: &str = "products";
}
