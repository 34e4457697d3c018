//! Payment gateway trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{ChargeId, Money};

/// Currency used for all charges.
pub const DEFAULT_CURRENCY: &str = "usd";

/// Opaque reference to a payment method held by the gateway (a token,
/// never raw card data).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentMethodRef(String);

impl PaymentMethodRef {
    /// Creates a new payment method reference.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PaymentMethodRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PaymentMethodRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Idempotency key tying one checkout attempt to at most one charge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Creates a new idempotency key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A charge request sent to the gateway.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    /// Amount to charge.
    pub amount: Money,
    /// ISO currency code.
    pub currency: String,
    /// The payment method to charge.
    pub method: PaymentMethodRef,
    /// Key deduplicating retries of the same checkout attempt.
    pub idempotency_key: IdempotencyKey,
}

/// A confirmed charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charge {
    /// The charge reference assigned by the gateway.
    pub id: ChargeId,
}

/// A completed refund.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refund {
    /// The refund reference assigned by the gateway.
    pub id: String,
}

/// Errors reported by the payment gateway.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The charge was declined by the processor.
    #[error("declined: {reason}")]
    Declined { reason: String },

    /// The gateway could not be reached or timed out.
    #[error("gateway unavailable: {reason}")]
    Unavailable { reason: String },

    /// The charge is not known to the gateway.
    #[error("unknown charge: {charge_id}")]
    UnknownCharge { charge_id: String },

    /// The charge has already been refunded.
    #[error("charge already refunded: {charge_id}")]
    AlreadyRefunded { charge_id: String },
}

/// Contract to the external payment processor.
///
/// Both operations are synchronous from the caller's perspective: a
/// returned `Charge` is confirmed, and every failure is a typed error.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates and confirms a charge.
    ///
    /// Calls carrying an idempotency key already seen return the original
    /// charge instead of charging again.
    async fn charge_and_confirm(&self, request: ChargeRequest) -> Result<Charge, PaymentError>;

    /// Refunds a prior charge, fully when `amount` is None.
    async fn refund(
        &self,
        charge_id: &ChargeId,
        amount: Option<Money>,
    ) -> Result<Refund, PaymentError>;
}

#[derive(Debug)]
struct ChargeRecord {
    amount: Money,
    refunded: bool,
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    charges: HashMap<String, ChargeRecord>,
    refunds: HashMap<String, String>,
    by_idempotency_key: HashMap<String, String>,
    next_charge: u32,
    next_refund: u32,
    decline_on_charge: bool,
    fail_on_refund: bool,
}

/// In-memory payment gateway for testing and the default API state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory payment gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to decline charge calls.
    pub fn set_decline_on_charge(&self, decline: bool) {
        self.state.write().unwrap().decline_on_charge = decline;
    }

    /// Configures the gateway to fail refund calls.
    pub fn set_fail_on_refund(&self, fail: bool) {
        self.state.write().unwrap().fail_on_refund = fail;
    }

    /// Returns the number of charges ever created.
    pub fn charge_count(&self) -> usize {
        self.state.read().unwrap().charges.len()
    }

    /// Returns the number of charges not yet refunded.
    pub fn active_charge_count(&self) -> usize {
        self.state
            .read()
            .unwrap()
            .charges
            .values()
            .filter(|c| !c.refunded)
            .count()
    }

    /// Returns the number of refunds issued.
    pub fn refund_count(&self) -> usize {
        self.state.read().unwrap().refunds.len()
    }

    /// Returns true if a charge exists with the given ID.
    pub fn has_charge(&self, charge_id: &ChargeId) -> bool {
        self.state
            .read()
            .unwrap()
            .charges
            .contains_key(charge_id.as_str())
    }

    /// Returns true if the given charge has been refunded.
    pub fn charge_refunded(&self, charge_id: &ChargeId) -> bool {
        self.state
            .read()
            .unwrap()
            .charges
            .get(charge_id.as_str())
            .is_some_and(|c| c.refunded)
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn charge_and_confirm(&self, request: ChargeRequest) -> Result<Charge, PaymentError> {
        let mut state = self.state.write().unwrap();

        if let Some(existing) = state.by_idempotency_key.get(request.idempotency_key.as_str()) {
            return Ok(Charge {
                id: ChargeId::new(existing.clone()),
            });
        }

        if state.decline_on_charge {
            return Err(PaymentError::Declined {
                reason: "card declined".to_string(),
            });
        }

        state.next_charge += 1;
        let charge_id = format!("CH-{:04}", state.next_charge);
        state.charges.insert(
            charge_id.clone(),
            ChargeRecord {
                amount: request.amount,
                refunded: false,
            },
        );
        state
            .by_idempotency_key
            .insert(request.idempotency_key.as_str().to_string(), charge_id.clone());

        Ok(Charge {
            id: ChargeId::new(charge_id),
        })
    }

    async fn refund(
        &self,
        charge_id: &ChargeId,
        amount: Option<Money>,
    ) -> Result<Refund, PaymentError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_refund {
            return Err(PaymentError::Unavailable {
                reason: "gateway unavailable".to_string(),
            });
        }

        let record =
            state
                .charges
                .get_mut(charge_id.as_str())
                .ok_or_else(|| PaymentError::UnknownCharge {
                    charge_id: charge_id.to_string(),
                })?;

        if record.refunded {
            return Err(PaymentError::AlreadyRefunded {
                charge_id: charge_id.to_string(),
            });
        }

        if let Some(amount) = amount
            && amount > record.amount
        {
            return Err(PaymentError::Declined {
                reason: format!("refund {amount} exceeds charge {}", record.amount),
            });
        }

        record.refunded = true;
        state.next_refund += 1;
        let refund_id = format!("RF-{:04}", state.next_refund);
        state
            .refunds
            .insert(refund_id.clone(), charge_id.to_string());

        Ok(Refund { id: refund_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(key: &str) -> ChargeRequest {
        ChargeRequest {
            amount: Money::from_cents(5000),
            currency: DEFAULT_CURRENCY.to_string(),
            method: PaymentMethodRef::new("pm_test"),
            idempotency_key: IdempotencyKey::new(key),
        }
    }

    #[tokio::test]
    async fn test_charge_and_refund() {
        let gateway = InMemoryPaymentGateway::new();

        let charge = gateway.charge_and_confirm(request("attempt-1")).await.unwrap();
        assert!(charge.id.as_str().starts_with("CH-"));
        assert_eq!(gateway.charge_count(), 1);
        assert!(gateway.has_charge(&charge.id));

        let refund = gateway.refund(&charge.id, None).await.unwrap();
        assert!(refund.id.starts_with("RF-"));
        assert!(gateway.charge_refunded(&charge.id));
        assert_eq!(gateway.active_charge_count(), 0);
    }

    #[tokio::test]
    async fn test_idempotency_key_deduplicates_charges() {
        let gateway = InMemoryPaymentGateway::new();

        let first = gateway.charge_and_confirm(request("attempt-1")).await.unwrap();
        let second = gateway.charge_and_confirm(request("attempt-1")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(gateway.charge_count(), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_create_distinct_charges() {
        let gateway = InMemoryPaymentGateway::new();

        let first = gateway.charge_and_confirm(request("attempt-1")).await.unwrap();
        let second = gateway.charge_and_confirm(request("attempt-2")).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(gateway.charge_count(), 2);
    }

    #[tokio::test]
    async fn test_decline_on_charge() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_decline_on_charge(true);

        let result = gateway.charge_and_confirm(request("attempt-1")).await;
        assert!(matches!(result, Err(PaymentError::Declined { .. })));
        assert_eq!(gateway.charge_count(), 0);
    }

    #[tokio::test]
    async fn test_refund_unknown_charge() {
        let gateway = InMemoryPaymentGateway::new();

        let result = gateway.refund(&ChargeId::new("CH-9999"), None).await;
        assert!(matches!(result, Err(PaymentError::UnknownCharge { .. })));
    }

    #[tokio::test]
    async fn test_double_refund_is_rejected() {
        let gateway = InMemoryPaymentGateway::new();
        let charge = gateway.charge_and_confirm(request("attempt-1")).await.unwrap();

        gateway.refund(&charge.id, None).await.unwrap();
        let result = gateway.refund(&charge.id, None).await;
        assert!(matches!(result, Err(PaymentError::AlreadyRefunded { .. })));
    }

    #[tokio::test]
    async fn test_partial_refund_over_charge_amount_is_rejected() {
        let gateway = InMemoryPaymentGateway::new();
        let charge = gateway.charge_and_confirm(request("attempt-1")).await.unwrap();

        let result = gateway
            .refund(&charge.id, Some(Money::from_cents(6000)))
            .await;
        assert!(matches!(result, Err(PaymentError::Declined { .. })));
    }

    #[tokio::test]
    async fn test_sequential_charge_ids() {
        let gateway = InMemoryPaymentGateway::new();

        let c1 = gateway.charge_and_confirm(request("a")).await.unwrap();
        let c2 = gateway.charge_and_confirm(request("b")).await.unwrap();

        assert_eq!(c1.id.as_str(), "CH-0001");
        assert_eq!(c2.id.as_str(), "CH-0002");
    }
}
