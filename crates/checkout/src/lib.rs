//! Order fulfillment core.
//!
//! This crate drives the cart → payment → order → inventory sequence as one
//! logical transaction:
//! 1. Snapshot and validate the cart
//! 2. Price each line and charge the payment gateway
//! 3. Persist the order
//! 4. Reserve inventory
//! 5. Clear the cart
//!
//! Any failure after the charge rolls back the side effects already
//! performed within the same call. Cancellation runs the reverse sequence
//! (refund, stock release, status transition); its sub-steps are
//! independent, and partial failures are reported per step.

pub mod attempt;
pub mod compensation;
pub mod error;
pub mod orchestrator;
pub mod services;

pub use attempt::{AttemptPhase, CheckoutAttempt};
pub use compensation::{CompensationReport, StepReport};
pub use error::FulfillmentError;
pub use orchestrator::FulfillmentOrchestrator;
pub use services::{
    Charge, ChargeRequest, IdempotencyKey, InMemoryPaymentGateway, PaymentError, PaymentGateway,
    PaymentMethodRef, Refund,
};
