//! Product seeding endpoint (administrators only).
//!
//! Full catalog CRUD lives elsewhere; this surface creates the catalog
//! record and its stock record together, the way products enter the system.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use docstore::DocumentStore;
use domain::{Money, ProductRecord, ProductRef};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::identity::Identity;

use super::AppState;

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub product_id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub available: u32,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub product_id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub available: u32,
}

/// POST /products — create a product with its stock record.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(actor): Identity,
    Json(req): Json<CreateProductRequest>,
) -> Result<(axum::http::StatusCode, Json<ProductResponse>), ApiError> {
    if !actor.admin {
        return Err(ApiError::Forbidden(
            "administrator rights required".to_string(),
        ));
    }
    if req.unit_price_cents <= 0 {
        return Err(ApiError::BadRequest(format!(
            "unit price must be positive, got {}",
            req.unit_price_cents
        )));
    }

    let product = ProductRef::new(req.product_id.as_str());
    state
        .catalog
        .upsert(ProductRecord {
            product: product.clone(),
            name: req.name.clone(),
            unit_price: Money::from_cents(req.unit_price_cents),
        })
        .await?;
    state.ledger.set_available(product, req.available).await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(ProductResponse {
            product_id: req.product_id,
            name: req.name,
            unit_price_cents: req.unit_price_cents,
            available: req.available,
        }),
    ))
}
