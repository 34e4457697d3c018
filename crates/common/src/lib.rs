//! Shared types used across the commerce backend.

mod types;

pub use types::{Actor, OrderId, OwnerId};
