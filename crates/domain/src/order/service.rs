//! Order service providing store-backed order operations.

use common::{Actor, OrderId, OwnerId};
use docstore::{Document, DocumentStore, DocumentStoreExt, PutOptions, Version};
use futures_util::StreamExt;

use crate::collections;
use crate::error::DomainError;

use super::{Order, OrderError, OrderStatus};

/// Service for managing orders.
///
/// Orders are stored one document per order, keyed by the order ID.
/// Authorization is owner-or-administrator for every read and transition.
pub struct OrderService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> OrderService<S> {
    /// Creates a new order service with the given document store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persists a freshly created order.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    pub async fn insert(&self, order: &Order) -> Result<Version, DomainError> {
        let document = Document::builder()
            .collection(collections::ORDERS)
            .key(order.id().to_string())
            .body(order)?
            .build();

        let version = self.store.put(document, PutOptions::expect_new()).await?;
        Ok(version)
    }

    /// Rewrites an existing order at the expected version.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    pub async fn update(&self, order: &Order, expected: Version) -> Result<Version, DomainError> {
        let document = Document::builder()
            .collection(collections::ORDERS)
            .key(order.id().to_string())
            .body(order)?
            .build();

        let version = self
            .store
            .put(document, PutOptions::expect_version(expected))
            .await?;
        Ok(version)
    }

    /// Loads an order by ID.
    ///
    /// Returns None if the order doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, order_id: OrderId) -> Result<Option<(Order, Version)>, DomainError> {
        let result = self
            .store
            .get_typed::<Order>(collections::ORDERS, &order_id.to_string())
            .await?;
        Ok(result)
    }

    /// Loads an order, enforcing that the actor may act on it.
    ///
    /// Fails with `OrderNotFound` for a missing order and `Forbidden` when
    /// the actor is neither the owner nor an administrator.
    #[tracing::instrument(skip(self))]
    pub async fn get_authorized(
        &self,
        order_id: OrderId,
        actor: Actor,
    ) -> Result<(Order, Version), DomainError> {
        let (order, version) = self
            .get(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))?;

        if !actor.can_manage(order.owner()) {
            return Err(OrderError::Forbidden { order: order_id }.into());
        }

        Ok((order, version))
    }

    /// Transitions an order's status on behalf of an actor.
    ///
    /// Plain status bookkeeping only; cancellation must go through the
    /// fulfillment orchestrator so compensation runs.
    #[tracing::instrument(skip(self))]
    pub async fn transition_status(
        &self,
        order_id: OrderId,
        actor: Actor,
        next: OrderStatus,
    ) -> Result<Order, DomainError> {
        let (mut order, version) = self.get_authorized(order_id, actor).await?;
        order.transition(next)?;
        self.update(&order, version).await?;
        Ok(order)
    }

    /// Lists all orders belonging to an owner.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_owner(&self, owner: OwnerId) -> Result<Vec<Order>, DomainError> {
        let mut stream = self.store.scan(collections::ORDERS).await?;
        let mut orders = Vec::new();

        while let Some(document) = stream.next().await {
            let order: Order = serde_json::from_value(document?.body)?;
            if order.owner() == owner {
                orders.push(order);
            }
        }

        Ok(orders)
    }
}
