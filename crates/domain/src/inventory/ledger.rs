//! Inventory ledger implementation.

use docstore::{Document, DocumentStore, DocumentStoreExt, PutOptions, StoreError};
use serde::{Deserialize, Serialize};

use crate::collections;
use crate::error::DomainError;
use crate::value_objects::ProductRef;

/// Per-product stock record, one document per product.
///
/// `available` never goes negative; it is mutated only through
/// reservation and release, never written directly by other flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    /// The product this record tracks.
    pub product: ProductRef,

    /// Units currently available for reservation.
    pub available: i64,
}

/// Outcome of a reservation attempt.
///
/// Insufficient stock is a normal, branchable outcome of checkout, not an
/// error; callers match on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// The stock was decremented.
    Reserved {
        /// Units remaining after the reservation.
        remaining: i64,
    },

    /// Available stock was below the requested quantity; nothing changed.
    Insufficient {
        /// Units available at the time of the attempt.
        available: i64,
    },
}

impl ReserveOutcome {
    /// Returns true if the reservation succeeded.
    pub fn is_reserved(&self) -> bool {
        matches!(self, ReserveOutcome::Reserved { .. })
    }
}

/// Ledger of per-product stock levels.
///
/// Reservation is an atomic compare-and-decrement against the stock
/// document; concurrent reservations for the same product serialize at the
/// store and can never jointly exceed the available quantity.
pub struct InventoryLedger<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> InventoryLedger<S> {
    /// Creates a new inventory ledger with the given document store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates or replaces the stock record for a product.
    ///
    /// Used when a product is created and by administrative restocking,
    /// never by checkout flows.
    #[tracing::instrument(skip(self))]
    pub async fn set_available(
        &self,
        product: ProductRef,
        available: u32,
    ) -> Result<(), DomainError> {
        let record = StockRecord {
            product: product.clone(),
            available: available as i64,
        };

        let document = Document::builder()
            .collection(collections::INVENTORY)
            .key(product.as_str())
            .body(&record)?
            .build();

        self.store.put(document, PutOptions::new()).await?;
        Ok(())
    }

    /// Returns the available quantity for a product, or None if the
    /// product has no stock record.
    #[tracing::instrument(skip(self))]
    pub async fn available(&self, product: &ProductRef) -> Result<Option<i64>, DomainError> {
        let record = self
            .store
            .get_typed::<StockRecord>(collections::INVENTORY, product.as_str())
            .await?;
        Ok(record.map(|(r, _)| r.available))
    }

    /// Atomically reserves `quantity` units of a product.
    ///
    /// Returns `Insufficient` without mutating anything when the available
    /// quantity is below `quantity` at the instant of the update. A product
    /// with no stock record reserves as `Insufficient { available: 0 }`.
    #[tracing::instrument(skip(self))]
    pub async fn reserve(
        &self,
        product: &ProductRef,
        quantity: u32,
    ) -> Result<ReserveOutcome, DomainError> {
        let result = self
            .store
            .adjust_counter(
                collections::INVENTORY,
                product.as_str(),
                "available",
                -(quantity as i64),
                Some(0),
            )
            .await;

        match result {
            Ok(remaining) => {
                metrics::counter!("inventory_reservations_total").increment(1);
                Ok(ReserveOutcome::Reserved { remaining })
            }
            Err(StoreError::ConditionFailed { current, .. }) => {
                metrics::counter!("inventory_insufficient_total").increment(1);
                Ok(ReserveOutcome::Insufficient { available: current })
            }
            Err(StoreError::NotFound { .. }) => {
                metrics::counter!("inventory_insufficient_total").increment(1);
                Ok(ReserveOutcome::Insufficient { available: 0 })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Releases `quantity` units back to a product's stock.
    ///
    /// Used by cancellation and rollback. Callers must not release the same
    /// reservation twice; the ledger increments unconditionally.
    ///
    /// Returns the new available quantity.
    #[tracing::instrument(skip(self))]
    pub async fn release(&self, product: &ProductRef, quantity: u32) -> Result<i64, DomainError> {
        let result = self
            .store
            .adjust_counter(
                collections::INVENTORY,
                product.as_str(),
                "available",
                quantity as i64,
                None,
            )
            .await;

        match result {
            Ok(available) => {
                metrics::counter!("inventory_releases_total").increment(1);
                Ok(available)
            }
            Err(StoreError::NotFound { .. }) => Err(DomainError::UnknownProduct {
                product: product.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore::InMemoryDocumentStore;

    fn ledger() -> InventoryLedger<InMemoryDocumentStore> {
        InventoryLedger::new(InMemoryDocumentStore::new())
    }

    #[tokio::test]
    async fn test_set_and_read_available() {
        let ledger = ledger();
        let product = ProductRef::new("SKU-001");

        ledger.set_available(product.clone(), 5).await.unwrap();
        assert_eq!(ledger.available(&product).await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_available_missing_record() {
        let ledger = ledger();
        let product = ProductRef::new("SKU-404");
        assert_eq!(ledger.available(&product).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reserve_decrements() {
        let ledger = ledger();
        let product = ProductRef::new("SKU-001");
        ledger.set_available(product.clone(), 5).await.unwrap();

        let outcome = ledger.reserve(&product, 3).await.unwrap();
        assert_eq!(outcome, ReserveOutcome::Reserved { remaining: 2 });
        assert_eq!(ledger.available(&product).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_reserve_insufficient_leaves_stock_unchanged() {
        let ledger = ledger();
        let product = ProductRef::new("SKU-001");
        ledger.set_available(product.clone(), 2).await.unwrap();

        let outcome = ledger.reserve(&product, 3).await.unwrap();
        assert_eq!(outcome, ReserveOutcome::Insufficient { available: 2 });
        assert_eq!(ledger.available(&product).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_reserve_unstocked_product_is_insufficient() {
        let ledger = ledger();
        let product = ProductRef::new("SKU-404");

        let outcome = ledger.reserve(&product, 1).await.unwrap();
        assert_eq!(outcome, ReserveOutcome::Insufficient { available: 0 });
    }

    #[tokio::test]
    async fn test_release_restores_reserved_quantity_exactly() {
        let ledger = ledger();
        let product = ProductRef::new("SKU-001");
        ledger.set_available(product.clone(), 5).await.unwrap();

        ledger.reserve(&product, 3).await.unwrap();
        let restored = ledger.release(&product, 3).await.unwrap();

        assert_eq!(restored, 5);
        assert_eq!(ledger.available(&product).await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_release_unknown_product_fails() {
        let ledger = ledger();
        let product = ProductRef::new("SKU-404");

        let result = ledger.release(&product, 1).await;
        assert!(matches!(result, Err(DomainError::UnknownProduct { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_reserves_never_exceed_available() {
        let store = InMemoryDocumentStore::new();
        let product = ProductRef::new("SKU-001");
        InventoryLedger::new(store.clone())
            .set_available(product.clone(), 4)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            let product = product.clone();
            handles.push(tokio::spawn(async move {
                InventoryLedger::new(store)
                    .reserve(&product, 1)
                    .await
                    .unwrap()
                    .is_reserved()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 4);
        assert_eq!(
            InventoryLedger::new(store).available(&product).await.unwrap(),
            Some(0)
        );
    }
}
