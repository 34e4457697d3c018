//! Order fulfillment orchestrator.

use common::{Actor, OrderId, OwnerId};
use docstore::DocumentStore;
use domain::{
    Cart, CartService, Catalog, DomainError, InventoryLedger, Money, Order, OrderError, OrderLine,
    OrderService, OrderStatus, ReserveOutcome, ShippingAddress,
};

use crate::attempt::{AttemptPhase, CheckoutAttempt};
use crate::compensation::{CompensationReport, StepReport};
use crate::error::FulfillmentError;
use crate::services::{ChargeRequest, DEFAULT_CURRENCY, PaymentGateway, PaymentMethodRef};

/// Drives the cart → payment → order → inventory sequence as one logical
/// transaction, and the reverse sequence for cancellation.
///
/// The orchestrator owns the transaction boundary; the cart, inventory,
/// catalog, and order services stay transaction-unaware. The payment
/// gateway is an injected dependency so it can be substituted in tests.
pub struct FulfillmentOrchestrator<S, P>
where
    S: DocumentStore + Clone,
    P: PaymentGateway,
{
    carts: CartService<S>,
    ledger: InventoryLedger<S>,
    catalog: Catalog<S>,
    orders: OrderService<S>,
    gateway: P,
}

impl<S, P> FulfillmentOrchestrator<S, P>
where
    S: DocumentStore + Clone,
    P: PaymentGateway,
{
    /// Creates a new orchestrator over a document store and payment gateway.
    pub fn new(store: S, gateway: P) -> Self {
        Self {
            carts: CartService::new(store.clone()),
            ledger: InventoryLedger::new(store.clone()),
            catalog: Catalog::new(store.clone()),
            orders: OrderService::new(store),
            gateway,
        }
    }

    /// Converts the owner's cart into a paid order.
    ///
    /// Runs the forward sequence: snapshot cart, validate stock, price the
    /// lines, charge, persist the order, reserve stock, clear the cart.
    /// Failures before the charge leave no side effects; failures after it
    /// are rolled back synchronously within this call.
    #[tracing::instrument(skip(self, shipping_address))]
    pub async fn place_order(
        &self,
        owner: OwnerId,
        method: PaymentMethodRef,
        shipping_address: ShippingAddress,
    ) -> Result<Order, FulfillmentError> {
        metrics::counter!("fulfillment_attempts_total").increment(1);
        let started = std::time::Instant::now();
        let mut attempt = CheckoutAttempt::new();

        // 1. Cart snapshot
        let snapshot = self.carts.snapshot_for_checkout(owner).await?;
        if snapshot.is_empty() {
            metrics::counter!("fulfillment_failed").increment(1);
            return Err(FulfillmentError::EmptyCart);
        }

        // 2. Confirm stock before any money moves
        for line in &snapshot.lines {
            let available = self.ledger.available(&line.product).await?.unwrap_or(0);
            if available < line.quantity as i64 {
                metrics::counter!("fulfillment_failed").increment(1);
                tracing::info!(
                    attempt_id = %attempt.id(),
                    product = %line.product,
                    available,
                    requested = line.quantity,
                    "stock validation failed"
                );
                return Err(FulfillmentError::InsufficientStock {
                    product: line.product.clone(),
                });
            }
        }
        attempt.advance(AttemptPhase::StockValidated);

        // 3. Price each line at this instant (price-at-purchase)
        let mut lines = Vec::with_capacity(snapshot.lines.len());
        for line in &snapshot.lines {
            let price = self.catalog.price(&line.product).await?.ok_or_else(|| {
                DomainError::UnknownProduct {
                    product: line.product.clone(),
                }
            })?;
            if !price.is_positive() {
                metrics::counter!("fulfillment_failed").increment(1);
                return Err(DomainError::from(OrderError::InvalidPrice {
                    price: price.cents(),
                })
                .into());
            }
            lines.push(OrderLine::new(line.product.clone(), line.quantity, price));
        }
        let total = lines
            .iter()
            .map(OrderLine::line_total)
            .fold(Money::zero(), |acc, m| acc + m);

        // 4. Charge and confirm
        let charge = match self
            .gateway
            .charge_and_confirm(ChargeRequest {
                amount: total,
                currency: DEFAULT_CURRENCY.to_string(),
                method,
                idempotency_key: attempt.idempotency_key(),
            })
            .await
        {
            Ok(charge) => charge,
            Err(e) => {
                metrics::counter!("fulfillment_failed").increment(1);
                tracing::warn!(attempt_id = %attempt.id(), reason = %e, "charge failed");
                return Err(FulfillmentError::PaymentFailed {
                    reason: e.to_string(),
                });
            }
        };
        attempt.record_charge(charge.clone());
        attempt.advance(AttemptPhase::PaymentCharged);

        // 5. Persist the order
        let order = match Order::new(
            OrderId::new(),
            owner,
            lines,
            shipping_address,
            charge.id.clone(),
        ) {
            Ok(order) => order,
            Err(e) => {
                return Err(self
                    .fail_with_rollback(&attempt, None, DomainError::from(e).into())
                    .await);
            }
        };
        match self.orders.insert(&order).await {
            Ok(version) => {
                attempt.record_order(order.id(), version);
                attempt.advance(AttemptPhase::OrderPersisted);
            }
            Err(e) => {
                return Err(self.fail_with_rollback(&attempt, None, e.into()).await);
            }
        }

        // 6. Reserve stock; a race with a concurrent checkout surfaces here
        for line in order.lines() {
            match self.ledger.reserve(&line.product, line.quantity).await {
                Ok(ReserveOutcome::Reserved { .. }) => {
                    attempt.record_reservation(line.product.clone(), line.quantity);
                }
                Ok(ReserveOutcome::Insufficient { available }) => {
                    tracing::info!(
                        attempt_id = %attempt.id(),
                        product = %line.product,
                        available,
                        requested = line.quantity,
                        "reservation lost the race"
                    );
                    let cause = FulfillmentError::InsufficientStock {
                        product: line.product.clone(),
                    };
                    return Err(self
                        .fail_with_rollback(&attempt, Some(order.clone()), cause)
                        .await);
                }
                Err(e) => {
                    return Err(self
                        .fail_with_rollback(&attempt, Some(order.clone()), e.into())
                        .await);
                }
            }
        }
        attempt.advance(AttemptPhase::StockReserved);

        // 7. Clear the cart, checked against the snapshot version
        if let Err(e) = self.carts.clear_checked(owner, snapshot.version).await {
            return Err(self
                .fail_with_rollback(&attempt, Some(order.clone()), e.into())
                .await);
        }
        attempt.advance(AttemptPhase::CartCleared);

        // 8. Committed
        attempt.advance(AttemptPhase::Committed);
        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("fulfillment_duration_seconds").record(duration);
        metrics::counter!("fulfillment_committed").increment(1);
        tracing::info!(
            attempt_id = %attempt.id(),
            order_id = %order.id(),
            total = %order.total(),
            "checkout committed"
        );

        Ok(order)
    }

    /// Cancels an order: refund, stock release, status transition.
    ///
    /// The three sub-steps are independent; a failed refund does not block
    /// stock release and vice versa. Progress is persisted on the order, so
    /// re-invoking on a partially cancelled order retries only the
    /// unfinished sub-steps.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        actor: Actor,
    ) -> Result<Order, FulfillmentError> {
        metrics::counter!("cancellations_total").increment(1);

        let (mut order, version) = self.orders.get_authorized(order_id, actor).await?;

        let resuming = order.cancellation().is_some();
        if !resuming && !order.status().can_cancel() {
            return Err(FulfillmentError::InvalidTransition {
                from: order.status(),
                to: OrderStatus::Cancelled,
            });
        }

        let mut report = CompensationReport::new(format!("cancel order {order_id}"));

        // 1. Refund the charge
        if order.cancellation().is_some_and(|c| c.refunded) {
            report.refund = StepReport::Skipped;
        } else {
            match self.gateway.refund(order.charge_id(), None).await {
                Ok(refund) => {
                    order.record_refund(refund.id);
                    report.refund = StepReport::Succeeded;
                }
                Err(e) => {
                    tracing::warn!(%order_id, reason = %e, "refund failed");
                    report.refund = StepReport::Failed {
                        reason: e.to_string(),
                    };
                }
            }
        }

        // 2. Release stock for every line not yet released
        let lines: Vec<OrderLine> = order.lines().to_vec();
        let mut release_failures = Vec::new();
        let mut released_now = false;
        for line in &lines {
            if order
                .cancellation()
                .is_some_and(|c| c.has_released(&line.product))
            {
                continue;
            }
            match self.ledger.release(&line.product, line.quantity).await {
                Ok(_) => {
                    order.record_release(line.product.clone());
                    released_now = true;
                }
                Err(e) => {
                    tracing::warn!(%order_id, product = %line.product, reason = %e, "stock release failed");
                    release_failures.push(format!("{}: {e}", line.product));
                }
            }
        }
        report.stock_release = if !release_failures.is_empty() {
            StepReport::Failed {
                reason: release_failures.join("; "),
            }
        } else if released_now {
            StepReport::Succeeded
        } else {
            StepReport::Skipped
        };

        // 3. Transition the status
        if order.status() == OrderStatus::Cancelled {
            report.status_update = StepReport::Skipped;
        } else {
            report.status_update = match order.transition(OrderStatus::Cancelled) {
                Ok(()) => StepReport::Succeeded,
                Err(e) => StepReport::Failed {
                    reason: e.to_string(),
                },
            };
        }

        // Persist whatever progress was made, even on partial failure
        if let Err(e) = self.orders.update(&order, version).await {
            tracing::error!(%order_id, reason = %e, "failed to persist cancellation progress");
            report.status_update = StepReport::Failed {
                reason: e.to_string(),
            };
        }

        if report.is_clean() {
            tracing::info!(%order_id, "order cancelled");
            Ok(order)
        } else {
            metrics::counter!("cancellation_partial_failures").increment(1);
            tracing::warn!(%order_id, failed = ?report.failed_steps(), "cancellation incomplete");
            Err(FulfillmentError::CompensationIncomplete(report))
        }
    }

    /// Loads an order on behalf of an actor.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(
        &self,
        order_id: OrderId,
        actor: Actor,
    ) -> Result<Order, FulfillmentError> {
        let (order, _) = self.orders.get_authorized(order_id, actor).await?;
        Ok(order)
    }

    /// Loads the owner's cart (convenience for transport adapters).
    pub async fn cart(&self, owner: OwnerId) -> Result<Cart, FulfillmentError> {
        Ok(self.carts.get_or_create(owner).await?)
    }

    /// Undoes the side effects of a failed checkout attempt, in the order
    /// refund → stock release → order cancellation, continuing past
    /// individual failures.
    async fn fail_with_rollback(
        &self,
        attempt: &CheckoutAttempt,
        order: Option<Order>,
        cause: FulfillmentError,
    ) -> FulfillmentError {
        metrics::counter!("fulfillment_failed").increment(1);
        metrics::counter!("fulfillment_rollbacks_total").increment(1);
        tracing::warn!(
            attempt_id = %attempt.id(),
            phase = %attempt.phase(),
            cause = %cause,
            "rolling back checkout attempt"
        );

        let report = self.roll_back(attempt, order, cause.to_string()).await;
        if report.is_clean() {
            cause
        } else {
            FulfillmentError::CompensationIncomplete(report)
        }
    }

    async fn roll_back(
        &self,
        attempt: &CheckoutAttempt,
        order: Option<Order>,
        cause: String,
    ) -> CompensationReport {
        let mut report = CompensationReport::new(cause);
        let mut order = order;

        // Refund the charge taken by this attempt
        if let Some(charge) = attempt.charge() {
            match self.gateway.refund(&charge.id, None).await {
                Ok(refund) => {
                    if let Some(order) = order.as_mut() {
                        order.record_refund(refund.id);
                    }
                    report.refund = StepReport::Succeeded;
                }
                Err(e) => {
                    tracing::error!(attempt_id = %attempt.id(), reason = %e, "rollback refund failed");
                    report.refund = StepReport::Failed {
                        reason: e.to_string(),
                    };
                }
            }
        }

        // Release the reservations taken by this attempt
        if !attempt.reservations().is_empty() {
            let mut failures = Vec::new();
            for (product, quantity) in attempt.reservations() {
                match self.ledger.release(product, *quantity).await {
                    Ok(_) => {
                        if let Some(order) = order.as_mut() {
                            order.record_release(product.clone());
                        }
                    }
                    Err(e) => {
                        tracing::error!(attempt_id = %attempt.id(), product = %product, reason = %e, "rollback release failed");
                        failures.push(format!("{product}: {e}"));
                    }
                }
            }
            report.stock_release = if failures.is_empty() {
                StepReport::Succeeded
            } else {
                StepReport::Failed {
                    reason: failures.join("; "),
                }
            };
        }

        // Mark the persisted order cancelled rather than leaving it
        // processing with no stock backing it
        if let (Some(mut order), Some((_, version))) = (order, attempt.order()) {
            order.begin_cancellation();
            let result = match order.transition(OrderStatus::Cancelled) {
                Ok(()) => self.orders.update(&order, version).await.map(|_| ()),
                Err(e) => Err(DomainError::from(e)),
            };
            report.status_update = match result {
                Ok(()) => StepReport::Succeeded,
                Err(e) => {
                    tracing::error!(attempt_id = %attempt.id(), reason = %e, "rollback order cancel failed");
                    StepReport::Failed {
                        reason: e.to_string(),
                    }
                }
            };
        }

        report
    }
}
