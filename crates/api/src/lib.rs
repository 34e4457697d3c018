//! HTTP API server with observability for the commerce backend.
//!
//! Provides REST endpoints for carts, checkout, and orders, with structured
//! logging (tracing) and Prometheus metrics. Authentication is out of
//! scope: the caller's identity arrives in headers (see [`identity`]).

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use checkout::{FulfillmentOrchestrator, InMemoryPaymentGateway};
use docstore::DocumentStore;
use domain::{CartService, Catalog, InventoryLedger, OrderService};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/cart", get(routes::carts::get::<S>))
        .route("/cart", delete(routes::carts::clear::<S>))
        .route("/cart/items", post(routes::carts::add_item::<S>))
        .route("/cart/items/{product_id}", put(routes::carts::update_item::<S>))
        .route(
            "/cart/items/{product_id}",
            delete(routes::carts::remove_item::<S>),
        )
        .route("/checkout", post(routes::orders::checkout::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route("/orders/{id}/status", post(routes::orders::status::<S>))
        .route("/products", post(routes::products::create::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state over a store, with the in-memory
/// payment gateway.
pub fn create_default_state<S: DocumentStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    let gateway = InMemoryPaymentGateway::new();
    create_state(store, gateway)
}

/// Creates application state over a store and an explicit gateway.
pub fn create_state<S: DocumentStore + Clone + 'static>(
    store: S,
    gateway: InMemoryPaymentGateway,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        orchestrator: FulfillmentOrchestrator::new(store.clone(), gateway.clone()),
        carts: CartService::new(store.clone()),
        orders: OrderService::new(store.clone()),
        catalog: Catalog::new(store.clone()),
        ledger: InventoryLedger::new(store.clone()),
        gateway,
        store,
    })
}
