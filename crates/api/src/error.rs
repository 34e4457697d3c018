//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::FulfillmentError;
use docstore::StoreError;
use domain::{CartError, DomainError, OrderError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// The caller may not perform this action.
    Forbidden(String),
    /// Fulfillment core error.
    Fulfillment(FulfillmentError),
    /// Domain logic error.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Partial compensation carries a structured per-step report
        if let ApiError::Fulfillment(FulfillmentError::CompensationIncomplete(report)) = self {
            let body = serde_json::json!({
                "error": "compensation incomplete",
                "steps": report,
            });
            return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response();
        }

        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Fulfillment(err) => fulfillment_error_to_response(err),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn fulfillment_error_to_response(err: FulfillmentError) -> (StatusCode, String) {
    let message = err.to_string();
    match err {
        FulfillmentError::EmptyCart => (StatusCode::UNPROCESSABLE_ENTITY, message),
        FulfillmentError::InsufficientStock { .. } => (StatusCode::CONFLICT, message),
        FulfillmentError::PaymentFailed { .. } => (StatusCode::PAYMENT_REQUIRED, message),
        FulfillmentError::OrderNotFound(_) => (StatusCode::NOT_FOUND, message),
        FulfillmentError::Forbidden(_) => (StatusCode::FORBIDDEN, message),
        FulfillmentError::InvalidTransition { .. } => (StatusCode::CONFLICT, message),
        FulfillmentError::CompensationIncomplete(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, message)
        }
        FulfillmentError::Domain(inner) => domain_error_to_response(inner),
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Cart(cart_err) => match cart_err {
            CartError::LineNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
            CartError::InvalidQuantity { .. } | CartError::LineQuantityCap { .. } => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
        },
        DomainError::Order(order_err) => match order_err {
            OrderError::InvalidTransition { .. } => (StatusCode::CONFLICT, err.to_string()),
            OrderError::Forbidden { .. } => (StatusCode::FORBIDDEN, err.to_string()),
            OrderError::NoLines
            | OrderError::InvalidQuantity { .. }
            | OrderError::InvalidPrice { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        },
        DomainError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::UnknownProduct { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::Store(StoreError::ConcurrencyConflict { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
