//! Caller identity extraction.
//!
//! Authentication itself is handled upstream; this adapter consumes the
//! identity the auth middleware forwards in headers:
//! - `x-user-id` — the caller's UUID (required)
//! - `x-admin` — `true`/`1` when the caller holds administrator rights

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::{Actor, OwnerId};
use uuid::Uuid;

use crate::error::ApiError;

/// Extractor wrapping the authenticated [`Actor`].
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub Actor);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::BadRequest("missing x-user-id header".to_string()))?;

        let uuid = Uuid::parse_str(raw)
            .map_err(|e| ApiError::BadRequest(format!("invalid x-user-id: {e}")))?;

        let admin = parts
            .headers
            .get("x-admin")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Identity(Actor {
            id: OwnerId::from_uuid(uuid),
            admin,
        }))
    }
}
