//! Postgres-backed document store.
//!
//! Every collection shares one JSONB table:
//!
//! | column       | type  | notes                                   |
//! |--------------|-------|-----------------------------------------|
//! | `collection` | text  | part of the primary key                 |
//! | `id`         | uuid  | part of the primary key                 |
//! | `unique_key` | text  | nullable; unique per collection         |
//! | `body`       | jsonb | the serialized document                 |
//!
//! Unique violations (`23505`) map to `StoreError::Duplicate`; every other
//! SQLx error maps to `StoreError::Backend`.

use std::marker::PhantomData;

use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use super::{Document, DocumentStore, StoreError};

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection  TEXT  NOT NULL,
    id          UUID  NOT NULL,
    unique_key  TEXT  NULL,
    body        JSONB NOT NULL,
    PRIMARY KEY (collection, id)
);
CREATE UNIQUE INDEX IF NOT EXISTS documents_unique_key
    ON documents (collection, unique_key)
    WHERE unique_key IS NOT NULL;
"#;

/// Create the `documents` table if it does not exist.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    Ok(())
}

#[derive(Debug)]
pub struct PgDocumentStore<D> {
    pool: PgPool,
    _doc: PhantomData<fn() -> D>,
}

impl<D> Clone for PgDocumentStore<D> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _doc: PhantomData,
        }
    }
}

impl<D> PgDocumentStore<D> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _doc: PhantomData,
        }
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::Duplicate {
                collection: "documents",
                key: format!("{operation}: {}", db_err.message()),
            };
        }
    }
    StoreError::Backend(format!("{operation}: {err}"))
}

fn decode<D: Document>(row: &sqlx::postgres::PgRow) -> Result<D, StoreError> {
    let body: serde_json::Value = row
        .try_get("body")
        .map_err(|e| map_sqlx_error("decode_body", e))?;
    Ok(serde_json::from_value(body)?)
}

#[async_trait::async_trait]
impl<D: Document> DocumentStore<D> for PgDocumentStore<D> {
    #[instrument(skip(self, doc), fields(collection = D::COLLECTION), err)]
    async fn insert(&self, doc: D) -> Result<D, StoreError> {
        let id: Uuid = doc.document_id().into();
        let body = serde_json::to_value(&doc)?;

        sqlx::query("INSERT INTO documents (collection, id, unique_key, body) VALUES ($1, $2, $3, $4)")
            .bind(D::COLLECTION)
            .bind(id)
            .bind(doc.unique_key())
            .bind(body)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert", e))?;

        Ok(doc)
    }

    async fn get(&self, id: D::Id) -> Result<Option<D>, StoreError> {
        let id: Uuid = id.into();
        let row = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(D::COLLECTION)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;

        row.as_ref().map(decode::<D>).transpose()
    }

    async fn find_by_unique_key(&self, key: &str) -> Result<Option<D>, StoreError> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND unique_key = $2")
            .bind(D::COLLECTION)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_unique_key", e))?;

        row.as_ref().map(decode::<D>).transpose()
    }

    async fn list(&self) -> Result<Vec<D>, StoreError> {
        let rows = sqlx::query("SELECT body FROM documents WHERE collection = $1 ORDER BY id")
            .bind(D::COLLECTION)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter().map(decode::<D>).collect()
    }

    #[instrument(skip(self, doc), fields(collection = D::COLLECTION), err)]
    async fn replace(&self, doc: D) -> Result<bool, StoreError> {
        let id: Uuid = doc.document_id().into();
        let body = serde_json::to_value(&doc)?;

        let result = sqlx::query(
            "UPDATE documents SET unique_key = $3, body = $4 WHERE collection = $1 AND id = $2",
        )
        .bind(D::COLLECTION)
        .bind(id)
        .bind(doc.unique_key())
        .bind(body)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("replace", e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, id), fields(collection = D::COLLECTION), err)]
    async fn delete(&self, id: D::Id) -> Result<bool, StoreError> {
        let id: Uuid = id.into();
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(D::COLLECTION)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        Ok(result.rows_affected() > 0)
    }
}
