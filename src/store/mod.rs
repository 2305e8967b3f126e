//! Document storage with change notifications.
//!
//! Every entity lives in its own [`Collection`] as schemaless JSON. Writers
//! go through [`DocumentStore`], and every successful write announces the
//! collection it touched on the change feed so subscribers can reload.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::{AgendaError, AgendaResult};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// How many change notifications a slow subscriber may fall behind by
/// before it is told it lagged.
pub const CHANGE_FEED_CAPACITY: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Activities,
    ScheduleRequests,
    ActivityTypes,
    Participants,
    Districts,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Activities,
        Collection::ScheduleRequests,
        Collection::ActivityTypes,
        Collection::Participants,
        Collection::Districts,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Activities => "activities",
            Collection::ScheduleRequests => "scheduleRequests",
            Collection::ActivityTypes => "activityTypes",
            Collection::Participants => "participants",
            Collection::Districts => "districts",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|collection| collection.name() == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stored document: the store-managed metadata plus the entity's fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub data: Map<String, Value>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl Document {
    /// Folds the metadata into the field map so the whole thing can be
    /// deserialized as one entity.
    pub fn into_value(self) -> AgendaResult<Value> {
        let metadata = serde_json::to_value(Metadata {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })?;

        let mut data = self.data;
        merge_fields(&mut data, into_fields(metadata)?);

        Ok(Value::Object(data))
    }
}

/// Converts an entity's serialized form into a field map, rejecting
/// anything that isn't a JSON object.
pub fn into_fields(value: Value) -> AgendaResult<Map<String, Value>> {
    match value {
        Value::Object(fields) => Ok(fields),
        other => Err(AgendaError::bad_request(format!(
            "Documents must be JSON objects, got {}",
            other
        ))),
    }
}

/// Shallow merge used by every backend's `update`: top-level keys in the
/// patch overwrite the stored ones, everything else is left alone.
pub fn merge_fields(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Adds a new document, assigning it an ID and timestamps.
    async fn insert(
        &self,
        collection: Collection,
        data: Map<String, Value>,
    ) -> AgendaResult<Document>;

    async fn get(&self, collection: Collection, id: Uuid) -> AgendaResult<Option<Document>>;

    /// Every document in the collection, oldest first.
    async fn list(&self, collection: Collection) -> AgendaResult<Vec<Document>>;

    /// Merges `patch` into the stored fields and bumps `updatedAt`.
    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Map<String, Value>,
    ) -> AgendaResult<Document>;

    async fn delete(&self, collection: Collection, id: Uuid) -> AgendaResult<()>;

    /// A feed of the collections that changed from now on.
    fn subscribe(&self) -> broadcast::Receiver<Collection>;
}

/// The shared handle to whichever backend the server was started with.
#[derive(Clone)]
pub struct Store(Arc<dyn DocumentStore>);

impl Store {
    pub fn new(store: impl DocumentStore + 'static) -> Self {
        Self(Arc::new(store))
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    pub async fn get_or_not_found(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> AgendaResult<Document> {
        self.get(collection, id)
            .await?
            .ok_or(AgendaError::NotFound { collection, id })
    }
}

impl Deref for Store {
    type Target = dyn DocumentStore;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn collection_names_round_trip() {
        for collection in Collection::ALL {
            assert_eq!(Collection::from_name(collection.name()), Some(collection));
        }
        assert_eq!(Collection::from_name("sessions"), None);
    }

    #[test]
    fn merge_overwrites_only_patched_keys() {
        let mut fields = into_fields(json!({ "title": "Cleanup", "location": "Park" })).unwrap();
        let patch = into_fields(json!({ "title": "Beach cleanup" })).unwrap();
        merge_fields(&mut fields, patch);

        assert_eq!(fields["title"], json!("Beach cleanup"));
        assert_eq!(fields["location"], json!("Park"));
    }

    #[test]
    fn non_objects_are_rejected() {
        assert!(matches!(
            into_fields(json!(["not", "an", "object"])),
            Err(AgendaError::BadRequest(_))
        ));
    }
}
