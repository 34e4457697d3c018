use thiserror::Error;

use crate::Version;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A concurrency conflict occurred when writing a document.
    /// The expected version did not match the actual version.
    #[error(
        "Concurrency conflict for {collection}/{key}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        collection: String,
        key: String,
        expected: Version,
        actual: Version,
    },

    /// A conditional counter update would have crossed its floor.
    #[error(
        "Condition failed for {collection}/{key}.{field}: delta {delta} not applicable to current value {current}"
    )]
    ConditionFailed {
        collection: String,
        key: String,
        field: String,
        delta: i64,
        current: i64,
    },

    /// The document was not found.
    #[error("Document not found: {collection}/{key}")]
    NotFound { collection: String, key: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
