use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use serde::de::DeserializeOwned;

use crate::{Document, Result, StoreError, Version};

/// Options for writing a document to the store.
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// Expected version of the document for optimistic concurrency control.
    /// If None, no version check is performed (use with caution).
    pub expected_version: Option<Version>,
}

impl PutOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the document to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the document to not exist (new document).
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// A stream of documents.
pub type DocumentStream = Pin<Box<dyn Stream<Item = Result<Document>> + Send>>;

/// Core trait for document store implementations.
///
/// A document store persists JSON documents grouped into collections and
/// supports an atomic conditional counter update used for stock
/// reservations. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Writes a document, inserting or replacing it.
    ///
    /// If `options.expected_version` is set, the operation fails with
    /// `ConcurrencyConflict` when the stored version doesn't match. The
    /// store assigns the new version itself.
    ///
    /// Returns the version of the document after the write.
    async fn put(&self, document: Document, options: PutOptions) -> Result<Version>;

    /// Retrieves a document by collection and key.
    ///
    /// Returns None if the document doesn't exist.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>>;

    /// Gets the current version of a document.
    ///
    /// Returns None if the document doesn't exist.
    async fn get_version(&self, collection: &str, key: &str) -> Result<Option<Version>>;

    /// Deletes a document.
    ///
    /// Returns true if a document was deleted, false if it didn't exist.
    async fn delete(&self, collection: &str, key: &str) -> Result<bool>;

    /// Atomically adds `delta` to an integer field of a document body.
    ///
    /// If `floor` is set and the result would drop below it, the document is
    /// left unchanged and `ConditionFailed` is returned with the current
    /// value. Fails with `NotFound` if the document doesn't exist. The
    /// update is linearizable per document key.
    ///
    /// Returns the new value of the field.
    async fn adjust_counter(
        &self,
        collection: &str,
        key: &str,
        field: &str,
        delta: i64,
        floor: Option<i64>,
    ) -> Result<i64>;

    /// Streams all documents in a collection, ordered by key.
    async fn scan(&self, collection: &str) -> Result<DocumentStream>;
}

/// Extension trait providing convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Checks if a document exists.
    async fn exists(&self, collection: &str, key: &str) -> Result<bool> {
        Ok(self.get_version(collection, key).await?.is_some())
    }

    /// Retrieves a document body deserialized into `T`, along with its version.
    ///
    /// Returns None if the document doesn't exist.
    async fn get_typed<T: DeserializeOwned>(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<(T, Version)>> {
        match self.get(collection, key).await? {
            Some(doc) => {
                let value: T = serde_json::from_value(doc.body)?;
                Ok(Some((value, doc.version)))
            }
            None => Ok(None),
        }
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}

/// Validates a document before writing.
pub fn validate_document_for_put(document: &Document) -> Result<()> {
    if document.collection.is_empty() {
        return Err(StoreError::Serialization(serde_json::Error::io(
            std::io::Error::other("Document collection must not be empty"),
        )));
    }
    if document.key.is_empty() {
        return Err(StoreError::Serialization(serde_json::Error::io(
            std::io::Error::other("Document key must not be empty"),
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_options_expectations() {
        assert!(PutOptions::new().expected_version.is_none());
        assert_eq!(
            PutOptions::expect_new().expected_version,
            Some(Version::initial())
        );
        assert_eq!(
            PutOptions::expect_version(Version::new(3)).expected_version,
            Some(Version::new(3))
        );
    }

    #[test]
    fn validate_rejects_empty_collection_and_key() {
        let doc = Document::builder()
            .collection("")
            .key("k")
            .body_raw(serde_json::json!({}))
            .build();
        assert!(validate_document_for_put(&doc).is_err());

        let doc = Document::builder()
            .collection("c")
            .key("")
            .body_raw(serde_json::json!({}))
            .build();
        assert!(validate_document_for_put(&doc).is_err());

        let doc = Document::builder()
            .collection("c")
            .key("k")
            .body_raw(serde_json::json!({}))
            .build();
        assert!(validate_document_for_put(&doc).is_ok());
    }
}
