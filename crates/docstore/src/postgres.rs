use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Document, Result, StoreError, Version,
    store::{DocumentStore, DocumentStream, PutOptions, validate_document_for_put},
};

/// PostgreSQL-backed document store implementation.
///
/// Documents live in a single `documents` table keyed by
/// `(collection, key)` with a JSONB body. Counter adjustments are issued
/// as a single conditional UPDATE so they are atomic per document.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_document(row: PgRow) -> Result<Document> {
        Ok(Document {
            collection: row.try_get("collection")?,
            key: row.try_get("key")?,
            version: Version::new(row.try_get("version")?),
            updated_at: row.try_get("updated_at")?,
            body: row.try_get("body")?,
        })
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[tracing::instrument(skip(self, document), fields(collection = %document.collection, key = %document.key))]
    async fn put(&self, document: Document, options: PutOptions) -> Result<Version> {
        validate_document_for_put(&document)?;

        let mut tx = self.pool.begin().await?;

        let current: Option<i64> = sqlx::query_scalar(
            "SELECT version FROM documents WHERE collection = $1 AND key = $2 FOR UPDATE",
        )
        .bind(&document.collection)
        .bind(&document.key)
        .fetch_optional(&mut *tx)
        .await?;

        let actual = Version::new(current.unwrap_or(0));

        if let Some(expected) = options.expected_version
            && actual != expected
        {
            return Err(StoreError::ConcurrencyConflict {
                collection: document.collection,
                key: document.key,
                expected,
                actual,
            });
        }

        let new_version = actual.next();

        sqlx::query(
            r#"
            INSERT INTO documents (collection, key, version, updated_at, body)
            VALUES ($1, $2, $3, NOW(), $4)
            ON CONFLICT (collection, key)
            DO UPDATE SET version = $3, updated_at = NOW(), body = $4
            "#,
        )
        .bind(&document.collection)
        .bind(&document.key)
        .bind(new_version.as_i64())
        .bind(&document.body)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(new_version)
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        let row = sqlx::query(
            r#"
            SELECT collection, key, version, updated_at, body
            FROM documents
            WHERE collection = $1 AND key = $2
            "#,
        )
        .bind(collection)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn get_version(&self, collection: &str, key: &str) -> Result<Option<Version>> {
        let version: Option<i64> = sqlx::query_scalar(
            "SELECT version FROM documents WHERE collection = $1 AND key = $2",
        )
        .bind(collection)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(version.map(Version::new))
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND key = $2")
            .bind(collection)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn adjust_counter(
        &self,
        collection: &str,
        key: &str,
        field: &str,
        delta: i64,
        floor: Option<i64>,
    ) -> Result<i64> {
        // Single conditional UPDATE; RETURNING reads the updated row.
        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE documents
            SET body = jsonb_set(
                    body,
                    ARRAY[$3::text],
                    to_jsonb(COALESCE(body->>$3, '0')::bigint + $4)
                ),
                version = version + 1,
                updated_at = NOW()
            WHERE collection = $1
              AND key = $2
              AND ($5::bigint IS NULL OR COALESCE(body->>$3, '0')::bigint + $4 >= $5)
            RETURNING COALESCE(body->>$3, '0')::bigint
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(field)
        .bind(delta)
        .bind(floor)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(value) => Ok(value),
            None => match self.get(collection, key).await? {
                Some(doc) => Err(StoreError::ConditionFailed {
                    collection: collection.to_string(),
                    key: key.to_string(),
                    field: field.to_string(),
                    delta,
                    current: doc
                        .body
                        .get(field)
                        .and_then(serde_json::Value::as_i64)
                        .unwrap_or(0),
                }),
                None => Err(StoreError::NotFound {
                    collection: collection.to_string(),
                    key: key.to_string(),
                }),
            },
        }
    }

    async fn scan(&self, collection: &str) -> Result<DocumentStream> {
        use futures_util::stream;

        let rows = sqlx::query(
            r#"
            SELECT collection, key, version, updated_at, body
            FROM documents
            WHERE collection = $1
            ORDER BY key ASC
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        let documents: Vec<Result<Document>> =
            rows.into_iter().map(Self::row_to_document).collect();

        Ok(Box::pin(stream::iter(documents)))
    }
}
