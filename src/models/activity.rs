use async_graphql::{ComplexObject, InputObject, SimpleObject};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::{Date, OffsetDateTime, UtcOffset};
use uuid::Uuid;

use crate::error::{AgendaError, AgendaResult};
use crate::models::calendar::{activities_on_date, ActivityStatus, Scheduled};
use crate::models::{DateTime, Record};
use crate::store::{into_fields, Collection, Store};
use crate::util::{current_time, optional, required};

/// A scheduled activity shown on the calendar
#[derive(Clone, Debug, PartialEq, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
#[graphql(complex)]
pub struct Activity {
    /// The ID of the activity
    pub id: Uuid,
    /// The name of the activity
    pub title: String,
    /// General information or details about this activity
    pub description: String,
    /// The kind of activity (see ActivityType)
    pub r#type: Option<String>,
    /// Where this activity will be held
    pub location: String,
    /// Whether visitors can see this activity
    pub is_public: bool,
    /// Who is running the activity (see Participant)
    pub participant: Option<String>,
    /// The district the activity is held in (see District)
    pub district: Option<String>,

    #[graphql(skip)]
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[graphql(skip)]
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    #[graphql(skip)]
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[graphql(skip)]
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[ComplexObject]
impl Activity {
    /// When the activity starts
    pub async fn start_date(&self) -> DateTime {
        DateTime::from(self.start_date)
    }

    /// When the activity ends
    pub async fn end_date(&self) -> DateTime {
        DateTime::from(self.end_date)
    }

    /// When the activity was first added
    pub async fn created_at(&self) -> DateTime {
        DateTime::from(self.created_at)
    }

    /// When the activity was last changed
    pub async fn updated_at(&self) -> DateTime {
        DateTime::from(self.updated_at)
    }

    /// Whether the activity is happening now, upcoming, or over
    pub async fn status(&self) -> ActivityStatus {
        self.status_at(current_time(UtcOffset::UTC))
    }
}

impl Record for Activity {
    const COLLECTION: Collection = Collection::Activities;
}

impl Scheduled for Activity {
    fn start(&self) -> OffsetDateTime {
        self.start_date
    }

    fn end(&self) -> OffsetDateTime {
        self.end_date
    }
}

/// The stored fields of an activity.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ActivityFields {
    pub title: String,
    pub description: String,
    pub r#type: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    pub location: String,
    pub is_public: bool,
    pub participant: Option<String>,
    pub district: Option<String>,
}

impl ActivityFields {
    fn validate(self) -> AgendaResult<Self> {
        ensure_ordered(self.start_date, self.end_date)?;

        Ok(Self {
            title: required("Title", &self.title)?,
            description: self.description.trim().to_owned(),
            r#type: optional(self.r#type),
            start_date: self.start_date,
            end_date: self.end_date,
            location: self.location.trim().to_owned(),
            is_public: self.is_public,
            participant: optional(self.participant),
            district: optional(self.district),
        })
    }
}

pub fn ensure_ordered(start: OffsetDateTime, end: OffsetDateTime) -> AgendaResult<()> {
    if start > end {
        Err(AgendaError::bad_request(
            "An activity cannot end before it starts",
        ))
    } else {
        Ok(())
    }
}

#[derive(InputObject)]
pub struct NewActivity {
    pub title: String,
    #[graphql(default)]
    pub description: String,
    pub r#type: Option<String>,
    pub start_date: DateTime,
    pub end_date: DateTime,
    #[graphql(default)]
    pub location: String,
    #[graphql(default = true)]
    pub is_public: bool,
    pub participant: Option<String>,
    pub district: Option<String>,
}

impl From<NewActivity> for ActivityFields {
    fn from(new_activity: NewActivity) -> Self {
        ActivityFields {
            title: new_activity.title,
            description: new_activity.description,
            r#type: new_activity.r#type,
            start_date: new_activity.start_date.0,
            end_date: new_activity.end_date.0,
            location: new_activity.location,
            is_public: new_activity.is_public,
            participant: new_activity.participant,
            district: new_activity.district,
        }
    }
}

/// Changes to an activity; absent fields are left as they are, and a
/// blank type, participant, or district clears it.
#[derive(Default, InputObject)]
pub struct ActivityUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub r#type: Option<String>,
    pub start_date: Option<DateTime>,
    pub end_date: Option<DateTime>,
    pub location: Option<String>,
    pub is_public: Option<bool>,
    pub participant: Option<String>,
    pub district: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    r#type: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", with = "time::serde::rfc3339::option")]
    start_date: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none", with = "time::serde::rfc3339::option")]
    end_date: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    participant: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    district: Option<Option<String>>,
}

impl ActivityUpdate {
    fn into_patch(self) -> AgendaResult<Map<String, Value>> {
        let patch = ActivityPatch {
            title: self
                .title
                .map(|title| required("Title", &title))
                .transpose()?,
            description: self.description.map(|d| d.trim().to_owned()),
            r#type: self.r#type.map(|t| optional(Some(t))),
            start_date: self.start_date.map(|d| d.0),
            end_date: self.end_date.map(|d| d.0),
            location: self.location.map(|l| l.trim().to_owned()),
            is_public: self.is_public,
            participant: self.participant.map(|p| optional(Some(p))),
            district: self.district.map(|d| optional(Some(d))),
        };

        into_fields(serde_json::to_value(patch)?)
    }
}

impl Activity {
    pub async fn with_id(id: Uuid, store: &Store) -> AgendaResult<Self> {
        let document = store.get_or_not_found(Self::COLLECTION, id).await?;
        Self::from_document(document)
    }

    /// All activities, earliest start first.
    pub async fn all(public_only: bool, store: &Store) -> AgendaResult<Vec<Self>> {
        let documents = store.list(Self::COLLECTION).await?;
        let mut activities = Self::from_documents(documents)?;
        if public_only {
            activities.retain(|activity| activity.is_public);
        }
        activities.sort_by_key(|activity| activity.start_date);

        Ok(activities)
    }

    pub async fn on_date(
        date: Date,
        offset: UtcOffset,
        public_only: bool,
        store: &Store,
    ) -> AgendaResult<Vec<Self>> {
        let activities = Self::all(public_only, store).await?;

        Ok(activities_on_date(&activities, date, offset))
    }

    #[tracing::instrument(skip_all, err)]
    pub async fn create(new_activity: NewActivity, store: &Store) -> AgendaResult<Self> {
        Self::create_from_fields(new_activity.into(), store).await
    }

    pub(crate) async fn create_from_fields(
        fields: ActivityFields,
        store: &Store,
    ) -> AgendaResult<Self> {
        let fields = fields.validate()?;
        let document = store
            .insert(Self::COLLECTION, into_fields(serde_json::to_value(fields)?)?)
            .await?;
        tracing::info!(id = %document.id, "activity added");

        Self::from_document(document)
    }

    #[tracing::instrument(skip(update, store), err)]
    pub async fn update(id: Uuid, update: ActivityUpdate, store: &Store) -> AgendaResult<Self> {
        let existing = Self::with_id(id, store).await?;
        ensure_ordered(
            update.start_date.map(|d| d.0).unwrap_or(existing.start_date),
            update.end_date.map(|d| d.0).unwrap_or(existing.end_date),
        )?;

        let document = store
            .update(Self::COLLECTION, id, update.into_patch()?)
            .await?;
        tracing::info!(%id, "activity updated");

        Self::from_document(document)
    }

    #[tracing::instrument(skip(store), err)]
    pub async fn delete(id: Uuid, store: &Store) -> AgendaResult<()> {
        store.delete(Self::COLLECTION, id).await?;
        tracing::info!(%id, "activity deleted");

        Ok(())
    }
}
