pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use document::{Document, DocumentBuilder, Version};
pub use error::{Result, StoreError};
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use store::{DocumentStore, DocumentStoreExt, DocumentStream, PutOptions};
