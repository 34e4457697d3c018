//! Route handlers and shared application state.

pub mod carts;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use checkout::{FulfillmentOrchestrator, InMemoryPaymentGateway};
use docstore::DocumentStore;
use domain::{CartService, Catalog, InventoryLedger, OrderService};

/// Shared application state accessible from all handlers.
pub struct AppState<S: DocumentStore + Clone> {
    pub orchestrator: FulfillmentOrchestrator<S, InMemoryPaymentGateway>,
    pub carts: CartService<S>,
    pub orders: OrderService<S>,
    pub catalog: Catalog<S>,
    pub ledger: InventoryLedger<S>,
    pub gateway: InMemoryPaymentGateway,
    pub store: S,
}
