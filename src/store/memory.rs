//! Documents held in process memory, one DashMap entry per collection.
//!
//! Each collection gets its own list of documents in insertion order.
//! Data is lost on restart; this backend serves development runs without
//! a database and the test suite.

use dashmap::DashMap;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{merge_fields, Collection, Document, DocumentStore, CHANGE_FEED_CAPACITY};
use crate::error::{AgendaError, AgendaResult};

pub struct MemoryStore {
    collections: DashMap<Collection, Vec<Document>>,
    changes: broadcast::Sender<Collection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);

        Self {
            collections: DashMap::new(),
            changes,
        }
    }

    fn announce(&self, collection: Collection) {
        // nobody listening is fine
        let _ = self.changes.send(collection);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(
        &self,
        collection: Collection,
        data: Map<String, Value>,
    ) -> AgendaResult<Document> {
        let now = OffsetDateTime::now_utc();
        let document = Document {
            id: Uuid::new_v4(),
            data,
            created_at: now,
            updated_at: now,
        };

        self.collections
            .entry(collection)
            .or_default()
            .push(document.clone());
        self.announce(collection);

        Ok(document)
    }

    async fn get(&self, collection: Collection, id: Uuid) -> AgendaResult<Option<Document>> {
        Ok(self.collections.get(&collection).and_then(|documents| {
            documents
                .iter()
                .find(|document| document.id == id)
                .cloned()
        }))
    }

    async fn list(&self, collection: Collection) -> AgendaResult<Vec<Document>> {
        Ok(self
            .collections
            .get(&collection)
            .map(|documents| documents.clone())
            .unwrap_or_default())
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Map<String, Value>,
    ) -> AgendaResult<Document> {
        let updated = {
            let mut documents = self
                .collections
                .get_mut(&collection)
                .ok_or(AgendaError::NotFound { collection, id })?;
            let document = documents
                .iter_mut()
                .find(|document| document.id == id)
                .ok_or(AgendaError::NotFound { collection, id })?;

            merge_fields(&mut document.data, patch);
            document.updated_at = OffsetDateTime::now_utc();
            document.clone()
        };
        self.announce(collection);

        Ok(updated)
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> AgendaResult<()> {
        {
            let mut documents = self
                .collections
                .get_mut(&collection)
                .ok_or(AgendaError::NotFound { collection, id })?;
            let index = documents
                .iter()
                .position(|document| document.id == id)
                .ok_or(AgendaError::NotFound { collection, id })?;
            documents.remove(index);
        }
        self.announce(collection);

        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Collection> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::into_fields;

    fn fields(value: Value) -> Map<String, Value> {
        into_fields(value).unwrap()
    }

    #[tokio::test]
    async fn insert_then_get_returns_the_document() {
        let store = MemoryStore::new();
        let inserted = store
            .insert(Collection::Districts, fields(json!({ "name": "North" })))
            .await
            .unwrap();

        let fetched = store.get(Collection::Districts, inserted.id).await.unwrap();
        assert_eq!(fetched, Some(inserted));
        assert_eq!(
            store.get(Collection::Participants, Uuid::new_v4()).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn list_keeps_insertion_order_per_collection() {
        let store = MemoryStore::new();
        for name in ["first", "second", "third"] {
            store
                .insert(Collection::ActivityTypes, fields(json!({ "name": name })))
                .await
                .unwrap();
        }
        store
            .insert(Collection::Districts, fields(json!({ "name": "elsewhere" })))
            .await
            .unwrap();

        let names = store
            .list(Collection::ActivityTypes)
            .await
            .unwrap()
            .into_iter()
            .map(|document| document.data["name"].clone())
            .collect::<Vec<_>>();
        assert_eq!(names, vec![json!("first"), json!("second"), json!("third")]);
    }

    #[tokio::test]
    async fn update_merges_and_missing_documents_are_not_found() {
        let store = MemoryStore::new();
        let inserted = store
            .insert(
                Collection::Activities,
                fields(json!({ "title": "Cleanup", "location": "Park" })),
            )
            .await
            .unwrap();

        let updated = store
            .update(
                Collection::Activities,
                inserted.id,
                fields(json!({ "location": "Beach" })),
            )
            .await
            .unwrap();
        assert_eq!(updated.data["title"], json!("Cleanup"));
        assert_eq!(updated.data["location"], json!("Beach"));
        assert!(updated.updated_at >= inserted.updated_at);

        let missing = store
            .update(Collection::Activities, Uuid::new_v4(), Map::new())
            .await;
        assert!(matches!(missing, Err(AgendaError::NotFound { .. })));
    }

    #[tokio::test]
    async fn writes_are_announced_on_the_change_feed() {
        let store = MemoryStore::new();
        let mut changes = store.subscribe();

        let inserted = store
            .insert(Collection::Participants, fields(json!({ "name": "Ana" })))
            .await
            .unwrap();
        store
            .delete(Collection::Participants, inserted.id)
            .await
            .unwrap();

        assert_eq!(changes.recv().await.unwrap(), Collection::Participants);
        assert_eq!(changes.recv().await.unwrap(), Collection::Participants);
        assert!(store
            .list(Collection::Participants)
            .await
            .unwrap()
            .is_empty());
    }
}
