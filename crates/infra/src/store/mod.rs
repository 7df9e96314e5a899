//! Document storage abstractions.
//!
//! Records are opaque JSON documents grouped by collection and keyed by a
//! UUID. A document may declare one secondary unique key (e.g. a user's
//! email); the store rejects a second document with the same key.

use std::hash::Hash;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryDocumentStore;
#[cfg(feature = "postgres")]
pub use postgres::PgDocumentStore;

/// A record the store can persist.
pub trait Document: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Id: Copy + Eq + Hash + Into<Uuid> + Send + Sync + 'static;

    /// Collection (table/namespace) name.
    const COLLECTION: &'static str;

    fn document_id(&self) -> Self::Id;

    /// Secondary unique key, if the collection has one.
    fn unique_key(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate document in {collection}: {key}")]
    Duplicate { collection: &'static str, key: String },

    #[error("document (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Async document store.
///
/// `list` returns documents in creation order (ids are time-ordered).
#[async_trait::async_trait]
pub trait DocumentStore<D: Document>: Send + Sync {
    /// Insert a new document. Fails with `Duplicate` on an id or unique-key clash.
    async fn insert(&self, doc: D) -> Result<D, StoreError>;

    async fn get(&self, id: D::Id) -> Result<Option<D>, StoreError>;

    async fn find_by_unique_key(&self, key: &str) -> Result<Option<D>, StoreError>;

    async fn list(&self) -> Result<Vec<D>, StoreError>;

    /// Overwrite an existing document. Returns `false` if it does not exist.
    async fn replace(&self, doc: D) -> Result<bool, StoreError>;

    /// Returns `false` if nothing was deleted.
    async fn delete(&self, id: D::Id) -> Result<bool, StoreError>;
}

#[async_trait::async_trait]
impl<D, S> DocumentStore<D> for Arc<S>
where
    D: Document,
    S: DocumentStore<D> + ?Sized,
{
    async fn insert(&self, doc: D) -> Result<D, StoreError> {
        (**self).insert(doc).await
    }

    async fn get(&self, id: D::Id) -> Result<Option<D>, StoreError> {
        (**self).get(id).await
    }

    async fn find_by_unique_key(&self, key: &str) -> Result<Option<D>, StoreError> {
        (**self).find_by_unique_key(key).await
    }

    async fn list(&self) -> Result<Vec<D>, StoreError> {
        (**self).list().await
    }

    async fn replace(&self, doc: D) -> Result<bool, StoreError> {
        (**self).replace(doc).await
    }

    async fn delete(&self, id: D::Id) -> Result<bool, StoreError> {
        (**self).delete(id).await
    }
}

mod documents {
    use safeaid_auth::User;
    use safeaid_beneficiaries::StoredBeneficiary;
    use safeaid_core::{BeneficiaryId, Entity, TrainingModuleId, UserId};
    use safeaid_training::TrainingModule;

    use super::Document;

    impl Document for User {
        type Id = UserId;
        const COLLECTION: &'static str = "users";

        fn document_id(&self) -> UserId {
            *self.id()
        }

        fn unique_key(&self) -> Option<String> {
            Some(self.email.as_str().to_string())
        }
    }

    impl Document for StoredBeneficiary {
        type Id = BeneficiaryId;
        const COLLECTION: &'static str = "beneficiaries";

        fn document_id(&self) -> BeneficiaryId {
            *self.id()
        }
    }

    impl Document for TrainingModule {
        type Id = TrainingModuleId;
        const COLLECTION: &'static str = "training_modules";

        fn document_id(&self) -> TrainingModuleId {
            *self.id()
        }
    }
}
