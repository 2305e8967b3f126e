//! The name lists that fill in the activity form's choices.

use async_graphql::{ComplexObject, SimpleObject};
use serde::Deserialize;
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AgendaError, AgendaResult};
use crate::models::{DateTime, Record};
use crate::store::{into_fields, Collection, Store};
use crate::util::required;

/// An entry in one of the name lists.
pub trait NamedEntry: Record {
    fn name(&self) -> &str;
    fn created_at(&self) -> OffsetDateTime;
}

macro_rules! name_list_entry {
    ($(#[$doc:meta])* $entry:ident in $collection:expr) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Deserialize, SimpleObject)]
        #[serde(rename_all = "camelCase")]
        #[graphql(complex)]
        pub struct $entry {
            pub id: Uuid,
            pub name: String,

            #[graphql(skip)]
            #[serde(with = "time::serde::rfc3339")]
            pub created_at: OffsetDateTime,
        }

        #[ComplexObject]
        impl $entry {
            /// When this name was added
            pub async fn created_at(&self) -> DateTime {
                DateTime::from(self.created_at)
            }
        }

        impl Record for $entry {
            const COLLECTION: Collection = $collection;
        }

        impl NamedEntry for $entry {
            fn name(&self) -> &str {
                &self.name
            }

            fn created_at(&self) -> OffsetDateTime {
                self.created_at
            }
        }
    };
}

name_list_entry!(
    /// A kind of activity, like "Workshop" or "Cleanup"
    ActivityType in Collection::ActivityTypes
);
name_list_entry!(
    /// A person or group who runs activities
    Participant in Collection::Participants
);
name_list_entry!(
    /// An area activities are held in
    District in Collection::Districts
);

/// Every entry in the list, newest first.
pub async fn all<T: NamedEntry>(store: &Store) -> AgendaResult<Vec<T>> {
    let documents = store.list(T::COLLECTION).await?;
    let mut entries = T::from_documents(documents)?;
    entries.sort_by_key(|entry| entry.created_at());
    entries.reverse();

    Ok(entries)
}

/// The duplicate check reads before it writes, so two concurrent adds of the
/// same name can both land; the store is last-write-wins and does not lock.
#[tracing::instrument(skip(store), fields(collection = %T::COLLECTION), err)]
pub async fn add<T: NamedEntry>(name: &str, store: &Store) -> AgendaResult<T> {
    let name = required("Name", name)?;
    let existing: Vec<T> = all(store).await?;
    if existing
        .iter()
        .any(|entry| entry.name().to_lowercase() == name.to_lowercase())
    {
        return Err(AgendaError::DuplicateName {
            collection: T::COLLECTION,
            name,
        });
    }

    let document = store
        .insert(T::COLLECTION, into_fields(json!({ "name": name }))?)
        .await?;
    tracing::info!(id = %document.id, "name added");

    T::from_document(document)
}

#[tracing::instrument(skip(store), fields(collection = %T::COLLECTION), err)]
pub async fn delete<T: NamedEntry>(id: Uuid, store: &Store) -> AgendaResult<()> {
    store.delete(T::COLLECTION, id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn names_are_trimmed_and_listed_newest_first() {
        let store = Store::in_memory();
        add::<District>(" North ", &store).await.unwrap();
        add::<District>("South", &store).await.unwrap();

        let names: Vec<String> = all::<District>(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|district| district.name)
            .collect();
        assert_eq!(names, ["South", "North"]);
    }

    #[tokio::test]
    async fn duplicates_are_rejected_ignoring_case() {
        let store = Store::in_memory();
        add::<ActivityType>("Workshop", &store).await.unwrap();

        assert!(matches!(
            add::<ActivityType>("  WORKSHOP", &store).await,
            Err(AgendaError::DuplicateName { collection: Collection::ActivityTypes, .. })
        ));
        assert!(matches!(
            add::<ActivityType>("", &store).await,
            Err(AgendaError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn lists_are_kept_apart() {
        let store = Store::in_memory();
        let participant = add::<Participant>("Workshop", &store).await.unwrap();
        add::<ActivityType>("Workshop", &store).await.unwrap();

        delete::<Participant>(participant.id, &store).await.unwrap();
        assert!(all::<Participant>(&store).await.unwrap().is_empty());
        assert_eq!(all::<ActivityType>(&store).await.unwrap().len(), 1);
    }
}
