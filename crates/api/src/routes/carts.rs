//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use docstore::DocumentStore;
use domain::Cart;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::identity::Identity;

use super::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    pub owner: String,
    pub lines: Vec<CartLineResponse>,
    pub total_quantity: u32,
}

#[derive(Serialize)]
pub struct CartLineResponse {
    pub product_id: String,
    pub quantity: u32,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        CartResponse {
            owner: cart.owner().to_string(),
            total_quantity: cart.total_quantity(),
            lines: cart
                .lines()
                .iter()
                .map(|l| CartLineResponse {
                    product_id: l.product.to_string(),
                    quantity: l.quantity,
                })
                .collect(),
        }
    }
}

// -- Handlers --

/// GET /cart — the caller's active cart.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.get_or_create(actor.id).await?;
    Ok(Json(cart.into()))
}

/// POST /cart/items — add a line, merging by sum.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .add_or_merge_line(actor.id, req.product_id.into(), req.quantity)
        .await?;
    Ok(Json(cart.into()))
}

/// PUT /cart/items/{product_id} — replace a line's quantity (0 removes).
#[tracing::instrument(skip(state, req))]
pub async fn update_item<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(product_id): Path<String>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .set_line_quantity(actor.id, product_id.into(), req.quantity)
        .await?;
    Ok(Json(cart.into()))
}

/// DELETE /cart/items/{product_id} — remove a line.
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Path(product_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.remove_line(actor.id, product_id.into()).await?;
    Ok(Json(cart.into()))
}

/// DELETE /cart — empty the caller's cart.
#[tracing::instrument(skip(state))]
pub async fn clear<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.clear(actor.id).await?;
    Ok(Json(cart.into()))
}
