//! Checkout and order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::OrderId;
use docstore::DocumentStore;
use domain::{Order, OrderStatus, ShippingAddress};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::identity::Identity;

use super::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub payment_method: String,
    pub shipping_address: ShippingAddress,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub owner: String,
    pub status: String,
    pub lines: Vec<OrderLineResponse>,
    pub total_cents: i64,
    pub charge_id: String,
    pub refund_id: Option<String>,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        OrderResponse {
            id: order.id().to_string(),
            owner: order.owner().to_string(),
            status: order.status().to_string(),
            lines: order
                .lines()
                .iter()
                .map(|l| OrderLineResponse {
                    product_id: l.product.to_string(),
                    quantity: l.quantity,
                    unit_price_cents: l.unit_price.cents(),
                })
                .collect(),
            total_cents: order.total().cents(),
            charge_id: order.charge_id().to_string(),
            refund_id: order.refund_id().map(String::from),
            created_at: order.created_at().to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /checkout — convert the caller's cart into a paid order.
#[tracing::instrument(skip(state, req))]
pub async fn checkout<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Json(req): Json<CheckoutRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderResponse>), ApiError> {
    let order = state
        .orchestrator
        .place_order(
            actor.id,
            req.payment_method.as_str().into(),
            req.shipping_address,
        )
        .await?;

    Ok((axum::http::StatusCode::CREATED, Json(order.into())))
}

/// GET /orders — list the caller's orders.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_for_owner(actor.id).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// GET /orders/{id} — load one order.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.orchestrator.get_order(order_id, actor).await?;
    Ok(Json(order.into()))
}

/// POST /orders/{id}/cancel — cancel an order with compensation.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.orchestrator.cancel_order(order_id, actor).await?;
    Ok(Json(order.into()))
}

/// POST /orders/{id}/status — transition an order's status.
///
/// A target of `cancelled` is routed through the orchestrator so the
/// compensation sequence always runs.
#[tracing::instrument(skip(state, req))]
pub async fn status<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let status = OrderStatus::parse(&req.status)
        .ok_or_else(|| ApiError::BadRequest(format!("unrecognized status: {}", req.status)))?;

    let order = if status == OrderStatus::Cancelled {
        state.orchestrator.cancel_order(order_id, actor).await?
    } else {
        state
            .orders
            .transition_status(order_id, actor, status)
            .await?
    };

    Ok(Json(order.into()))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("invalid order ID: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
