use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version number for a document, used for optimistic concurrency control.
///
/// Versions start at 1 for the first write and increment by 1 for each
/// subsequent write to the same document. Version 0 means "does not exist".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) for a document that does not exist yet.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the first version (1) assigned by the first write.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// A stored document along with its metadata.
///
/// Documents are grouped into named collections and addressed by a
/// collection-unique key. The body is an opaque JSON value; interpreting
/// it is the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// The collection this document belongs to (e.g. "carts", "orders").
    pub collection: String,

    /// The document key, unique within its collection.
    pub key: String,

    /// The version of the document as stored.
    pub version: Version,

    /// When the document was last written.
    pub updated_at: DateTime<Utc>,

    /// The document body as JSON.
    pub body: serde_json::Value,
}

impl Document {
    /// Creates a new document builder.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::default()
    }
}

/// Builder for constructing documents.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    collection: Option<String>,
    key: Option<String>,
    version: Option<Version>,
    updated_at: Option<DateTime<Utc>>,
    body: Option<serde_json::Value>,
}

impl DocumentBuilder {
    /// Sets the collection name.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Sets the document key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the version. If not set, the initial version is used; the store
    /// assigns the real version on write.
    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the timestamp. If not set, the current time will be used.
    pub fn updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Sets the body from a serializable value.
    pub fn body<T: Serialize>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Sets the body from a raw JSON value.
    pub fn body_raw(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Builds the document.
    ///
    /// # Panics
    ///
    /// Panics if required fields (collection, key, body) are not set.
    pub fn build(self) -> Document {
        Document {
            collection: self.collection.expect("collection is required"),
            key: self.key.expect("key is required"),
            version: self.version.unwrap_or_default(),
            updated_at: self.updated_at.unwrap_or_else(Utc::now),
            body: self.body.expect("body is required"),
        }
    }

    /// Tries to build the document, returning None if required fields are missing.
    pub fn try_build(self) -> Option<Document> {
        Some(Document {
            collection: self.collection?,
            key: self.key?,
            version: self.version.unwrap_or_default(),
            updated_at: self.updated_at.unwrap_or_else(Utc::now),
            body: self.body?,
        })
    }
}
