use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    Document, Result, StoreError, Version,
    store::{DocumentStore, DocumentStream, PutOptions, validate_document_for_put},
};

/// In-memory document store implementation for testing.
///
/// This implementation stores all documents in memory and provides
/// the same interface as the PostgreSQL implementation. All writes go
/// through a single write lock, so counter updates are linearizable.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<HashMap<(String, String), Document>>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of documents stored.
    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Returns the number of documents in a collection.
    pub async fn collection_count(&self, collection: &str) -> usize {
        self.documents
            .read()
            .await
            .keys()
            .filter(|(c, _)| c == collection)
            .count()
    }

    /// Clears all documents.
    pub async fn clear(&self) {
        self.documents.write().await.clear();
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn put(&self, mut document: Document, options: PutOptions) -> Result<Version> {
        validate_document_for_put(&document)?;

        let mut store = self.documents.write().await;
        let slot = (document.collection.clone(), document.key.clone());

        let current_version = store
            .get(&slot)
            .map(|d| d.version)
            .unwrap_or(Version::initial());

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            return Err(StoreError::ConcurrencyConflict {
                collection: document.collection,
                key: document.key,
                expected,
                actual: current_version,
            });
        }

        let new_version = current_version.next();
        document.version = new_version;
        document.updated_at = Utc::now();
        store.insert(slot, document);

        Ok(new_version)
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        let store = self.documents.read().await;
        Ok(store
            .get(&(collection.to_string(), key.to_string()))
            .cloned())
    }

    async fn get_version(&self, collection: &str, key: &str) -> Result<Option<Version>> {
        let store = self.documents.read().await;
        Ok(store
            .get(&(collection.to_string(), key.to_string()))
            .map(|d| d.version))
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<bool> {
        let mut store = self.documents.write().await;
        Ok(store
            .remove(&(collection.to_string(), key.to_string()))
            .is_some())
    }

    async fn adjust_counter(
        &self,
        collection: &str,
        key: &str,
        field: &str,
        delta: i64,
        floor: Option<i64>,
    ) -> Result<i64> {
        let mut store = self.documents.write().await;
        let slot = (collection.to_string(), key.to_string());

        let document = store.get_mut(&slot).ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        })?;

        let body = document.body.as_object_mut().ok_or_else(|| {
            StoreError::Serialization(serde_json::Error::io(std::io::Error::other(
                "counter document body must be a JSON object",
            )))
        })?;

        // A missing field is treated as zero, matching the COALESCE in the
        // PostgreSQL implementation.
        let current = body
            .get(field)
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0);
        let updated = current + delta;

        if let Some(floor) = floor
            && updated < floor
        {
            return Err(StoreError::ConditionFailed {
                collection: collection.to_string(),
                key: key.to_string(),
                field: field.to_string(),
                delta,
                current,
            });
        }

        body.insert(field.to_string(), serde_json::json!(updated));
        document.version = document.version.next();
        document.updated_at = Utc::now();

        Ok(updated)
    }

    async fn scan(&self, collection: &str) -> Result<DocumentStream> {
        use futures_util::stream;

        let store = self.documents.read().await;
        let mut documents: Vec<_> = store
            .values()
            .filter(|d| d.collection == collection)
            .cloned()
            .collect();
        documents.sort_by(|a, b| a.key.cmp(&b.key));

        let stream = stream::iter(documents.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock_document(key: &str, available: i64) -> Document {
        Document::builder()
            .collection("inventory")
            .key(key)
            .body_raw(serde_json::json!({"available": available}))
            .build()
    }

    #[tokio::test]
    async fn put_and_get_document() {
        let store = InMemoryDocumentStore::new();

        let version = store
            .put(stock_document("SKU-001", 5), PutOptions::expect_new())
            .await
            .unwrap();
        assert_eq!(version, Version::first());

        let doc = store.get("inventory", "SKU-001").await.unwrap().unwrap();
        assert_eq!(doc.version, Version::first());
        assert_eq!(doc.body["available"], 5);
    }

    #[tokio::test]
    async fn put_assigns_sequential_versions() {
        let store = InMemoryDocumentStore::new();

        let v1 = store
            .put(stock_document("SKU-001", 5), PutOptions::new())
            .await
            .unwrap();
        let v2 = store
            .put(stock_document("SKU-001", 7), PutOptions::new())
            .await
            .unwrap();

        assert_eq!(v1, Version::new(1));
        assert_eq!(v2, Version::new(2));
    }

    #[tokio::test]
    async fn concurrency_conflict_on_wrong_version() {
        let store = InMemoryDocumentStore::new();

        store
            .put(stock_document("SKU-001", 5), PutOptions::expect_new())
            .await
            .unwrap();

        let result = store
            .put(stock_document("SKU-001", 7), PutOptions::expect_new())
            .await;

        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn put_with_correct_expected_version_succeeds() {
        let store = InMemoryDocumentStore::new();

        store
            .put(stock_document("SKU-001", 5), PutOptions::expect_new())
            .await
            .unwrap();

        let result = store
            .put(
                stock_document("SKU-001", 7),
                PutOptions::expect_version(Version::first()),
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn adjust_counter_decrements_and_increments() {
        let store = InMemoryDocumentStore::new();
        store
            .put(stock_document("SKU-001", 5), PutOptions::expect_new())
            .await
            .unwrap();

        let remaining = store
            .adjust_counter("inventory", "SKU-001", "available", -3, Some(0))
            .await
            .unwrap();
        assert_eq!(remaining, 2);

        let restored = store
            .adjust_counter("inventory", "SKU-001", "available", 3, None)
            .await
            .unwrap();
        assert_eq!(restored, 5);
    }

    #[tokio::test]
    async fn adjust_counter_respects_floor() {
        let store = InMemoryDocumentStore::new();
        store
            .put(stock_document("SKU-001", 2), PutOptions::expect_new())
            .await
            .unwrap();

        let result = store
            .adjust_counter("inventory", "SKU-001", "available", -3, Some(0))
            .await;

        assert!(matches!(
            result,
            Err(StoreError::ConditionFailed { current: 2, .. })
        ));

        // Value is unchanged after a failed adjustment
        let doc = store.get("inventory", "SKU-001").await.unwrap().unwrap();
        assert_eq!(doc.body["available"], 2);
    }

    #[tokio::test]
    async fn adjust_counter_missing_document_fails() {
        let store = InMemoryDocumentStore::new();

        let result = store
            .adjust_counter("inventory", "SKU-404", "available", -1, Some(0))
            .await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn concurrent_adjustments_never_cross_floor() {
        let store = InMemoryDocumentStore::new();
        store
            .put(stock_document("SKU-001", 10), PutOptions::expect_new())
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .adjust_counter("inventory", "SKU-001", "available", -1, Some(0))
                    .await
                    .is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 10);
        let doc = store.get("inventory", "SKU-001").await.unwrap().unwrap();
        assert_eq!(doc.body["available"], 0);
    }

    #[tokio::test]
    async fn delete_document() {
        let store = InMemoryDocumentStore::new();
        store
            .put(stock_document("SKU-001", 5), PutOptions::expect_new())
            .await
            .unwrap();

        assert!(store.delete("inventory", "SKU-001").await.unwrap());
        assert!(!store.delete("inventory", "SKU-001").await.unwrap());
        assert!(store.get("inventory", "SKU-001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn scan_returns_collection_in_key_order() {
        use futures_util::StreamExt;

        let store = InMemoryDocumentStore::new();
        store
            .put(stock_document("SKU-002", 1), PutOptions::new())
            .await
            .unwrap();
        store
            .put(stock_document("SKU-001", 1), PutOptions::new())
            .await
            .unwrap();
        store
            .put(
                Document::builder()
                    .collection("products")
                    .key("SKU-001")
                    .body_raw(serde_json::json!({"name": "Widget"}))
                    .build(),
                PutOptions::new(),
            )
            .await
            .unwrap();

        let stream = store.scan("inventory").await.unwrap();
        let docs: Vec<_> = stream.collect().await;
        assert_eq!(docs.len(), 2);

        let keys: Vec<String> = docs.into_iter().map(|d| d.unwrap().key).collect();
        assert_eq!(keys, vec!["SKU-001", "SKU-002"]);
    }

    #[tokio::test]
    async fn get_version_reflects_writes() {
        let store = InMemoryDocumentStore::new();

        assert!(
            store
                .get_version("inventory", "SKU-001")
                .await
                .unwrap()
                .is_none()
        );

        store
            .put(stock_document("SKU-001", 5), PutOptions::new())
            .await
            .unwrap();
        store
            .adjust_counter("inventory", "SKU-001", "available", -1, Some(0))
            .await
            .unwrap();

        assert_eq!(
            store.get_version("inventory", "SKU-001").await.unwrap(),
            Some(Version::new(2))
        );
    }
}
