use std::collections::BTreeMap;
use std::sync::RwLock;

use uuid::Uuid;

use super::{Document, DocumentStore, StoreError};

/// In-memory document store for tests/dev.
///
/// Keyed by UUID in a `BTreeMap`, so iteration follows id (creation) order.
#[derive(Debug)]
pub struct InMemoryDocumentStore<D> {
    inner: RwLock<BTreeMap<Uuid, D>>,
}

impl<D> InMemoryDocumentStore<D> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<D> Default for InMemoryDocumentStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

#[async_trait::async_trait]
impl<D: Document> DocumentStore<D> for InMemoryDocumentStore<D> {
    async fn insert(&self, doc: D) -> Result<D, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let id: Uuid = doc.document_id().into();

        if map.contains_key(&id) {
            return Err(StoreError::Duplicate {
                collection: D::COLLECTION,
                key: id.to_string(),
            });
        }
        if let Some(key) = doc.unique_key() {
            if map.values().any(|d| d.unique_key().as_deref() == Some(key.as_str())) {
                return Err(StoreError::Duplicate {
                    collection: D::COLLECTION,
                    key,
                });
            }
        }

        map.insert(id, doc.clone());
        Ok(doc)
    }

    async fn get(&self, id: D::Id) -> Result<Option<D>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id.into()).cloned())
    }

    async fn find_by_unique_key(&self, key: &str) -> Result<Option<D>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map
            .values()
            .find(|d| d.unique_key().as_deref() == Some(key))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<D>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }

    async fn replace(&self, doc: D) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let id: Uuid = doc.document_id().into();
        if !map.contains_key(&id) {
            return Ok(false);
        }

        if let Some(key) = doc.unique_key() {
            let taken = map
                .iter()
                .any(|(other, d)| *other != id && d.unique_key().as_deref() == Some(key.as_str()));
            if taken {
                return Err(StoreError::Duplicate {
                    collection: D::COLLECTION,
                    key,
                });
            }
        }

        map.insert(id, doc);
        Ok(true)
    }

    async fn delete(&self, id: D::Id) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(&id.into()).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: Uuid,
        slug: String,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct NoteId(Uuid);

    impl From<NoteId> for Uuid {
        fn from(id: NoteId) -> Uuid {
            id.0
        }
    }

    impl Document for Note {
        type Id = NoteId;
        const COLLECTION: &'static str = "notes";

        fn document_id(&self) -> NoteId {
            NoteId(self.id)
        }

        fn unique_key(&self) -> Option<String> {
            Some(self.slug.clone())
        }
    }

    fn note(slug: &str) -> Note {
        Note {
            id: Uuid::now_v7(),
            slug: slug.to_string(),
        }
    }

    #[tokio::test]
    async fn insert_get_list_delete() {
        let store = InMemoryDocumentStore::new();
        let a = store.insert(note("a")).await.unwrap();
        let b = store.insert(note("b")).await.unwrap();

        assert_eq!(store.get(NoteId(a.id)).await.unwrap(), Some(a.clone()));
        assert_eq!(store.list().await.unwrap(), vec![a.clone(), b.clone()]);

        assert!(store.delete(NoteId(a.id)).await.unwrap());
        assert!(!store.delete(NoteId(a.id)).await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec![b]);
    }

    #[tokio::test]
    async fn unique_key_clash_is_rejected() {
        let store = InMemoryDocumentStore::new();
        store.insert(note("same")).await.unwrap();
        let err = store.insert(note("same")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { collection: "notes", .. }));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn find_by_unique_key() {
        let store = InMemoryDocumentStore::new();
        let a = store.insert(note("alpha")).await.unwrap();
        assert_eq!(store.find_by_unique_key("alpha").await.unwrap(), Some(a));
        assert_eq!(store.find_by_unique_key("beta").await.unwrap(), None);
    }

    #[tokio::test]
    async fn replace_requires_existing_document() {
        let store = InMemoryDocumentStore::new();
        let mut a = store.insert(note("a")).await.unwrap();
        assert!(!store.replace(note("ghost")).await.unwrap());

        a.slug = "renamed".to_string();
        assert!(store.replace(a.clone()).await.unwrap());
        assert_eq!(store.get(NoteId(a.id)).await.unwrap().unwrap().slug, "renamed");
    }

    #[tokio::test]
    async fn replace_cannot_steal_another_unique_key() {
        let store = InMemoryDocumentStore::new();
        store.insert(note("a")).await.unwrap();
        let mut b = store.insert(note("b")).await.unwrap();
        b.slug = "a".to_string();
        assert!(store.replace(b).await.is_err());
    }
}
