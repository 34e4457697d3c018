//! External service contracts consumed by the orchestrator.

pub mod payment;

pub use payment::{
    Charge, ChargeRequest, DEFAULT_CURRENCY, IdempotencyKey, InMemoryPaymentGateway, PaymentError,
    PaymentGateway, PaymentMethodRef, Refund,
};
