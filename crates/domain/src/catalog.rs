//! Product catalog reader.
//!
//! The catalog is owned by the (out-of-scope) product CRUD surface; the
//! checkout core only reads the live unit price from it, freezing that
//! price into the order at purchase time.

use docstore::{Document, DocumentStore, DocumentStoreExt, PutOptions};
use serde::{Deserialize, Serialize};

use crate::collections;
use crate::error::DomainError;
use crate::value_objects::{Money, ProductRef};

/// Catalog record for a single product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// The product reference.
    pub product: ProductRef,

    /// Human-readable product name.
    pub name: String,

    /// Current unit price.
    pub unit_price: Money,
}

/// Read (and seed) access to the product catalog.
pub struct Catalog<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> Catalog<S> {
    /// Creates a new catalog handle with the given document store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates or replaces a product record.
    #[tracing::instrument(skip(self))]
    pub async fn upsert(&self, record: ProductRecord) -> Result<(), DomainError> {
        let document = Document::builder()
            .collection(collections::PRODUCTS)
            .key(record.product.as_str())
            .body(&record)?
            .build();

        self.store.put(document, PutOptions::new()).await?;
        Ok(())
    }

    /// Returns a product record, or None if the product doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, product: &ProductRef) -> Result<Option<ProductRecord>, DomainError> {
        let record = self
            .store
            .get_typed::<ProductRecord>(collections::PRODUCTS, product.as_str())
            .await?;
        Ok(record.map(|(r, _)| r))
    }

    /// Returns a product's current unit price, or None if unknown.
    #[tracing::instrument(skip(self))]
    pub async fn price(&self, product: &ProductRef) -> Result<Option<Money>, DomainError> {
        Ok(self.get(product).await?.map(|r| r.unit_price))
    }
}
