use std::fmt;

use async_graphql::{ComplexObject, Context, Enum, InputObject, Result, SimpleObject};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AgendaError, AgendaResult};
use crate::graphql::AdminOnly;
use crate::models::activity::{ensure_ordered, Activity, ActivityFields};
use crate::models::{DateTime, Record};
use crate::store::{into_fields, Collection, Store};
use crate::util::{ensure_valid_email, optional, required};

/// The status of a schedule request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Enum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleRequestStatus {
    /// An admin has not responded to the request yet
    Pending,
    /// The request was turned into an activity
    Approved,
    /// The request was declined
    Rejected,
}

impl fmt::Display for ScheduleRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        })
    }
}

/// A visitor's request to put an activity on the calendar
#[derive(Clone, Debug, PartialEq, Deserialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
#[graphql(complex)]
pub struct ScheduleRequest {
    /// The ID of the schedule request
    pub id: Uuid,
    /// The name of the requested activity
    pub title: String,
    /// Any details the requester gave
    pub description: Option<String>,
    /// The kind of activity requested
    pub r#type: Option<String>,
    /// Where the activity would be held
    pub location: Option<String>,
    /// Who asked for the activity
    pub requester_name: String,
    /// Whether the request has been handled yet
    pub status: ScheduleRequestStatus,

    #[graphql(skip)]
    pub requester_email: Option<String>,
    #[graphql(skip)]
    pub requester_phone: Option<String>,
    #[graphql(skip)]
    pub activity: Option<Uuid>,
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
impl ScheduleRequest {
    /// How to email the requester
    #[graphql(guard = "AdminOnly")]
    pub async fn requester_email(&self) -> Option<String> {
        self.requester_email.clone()
    }

    /// How to call the requester
    #[graphql(guard = "AdminOnly")]
    pub async fn requester_phone(&self) -> Option<String> {
        self.requester_phone.clone()
    }

    /// If the request was approved, the activity created for it
    pub async fn activity(&self, ctx: &Context<'_>) -> Result<Option<Activity>> {
        let store: &Store = ctx.data_unchecked();
        match self.activity {
            Some(id) => match store.get(Collection::Activities, id).await? {
                Some(document) => Ok(Some(Activity::from_document(document)?)),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    /// When the activity would start
    pub async fn start_date(&self) -> DateTime {
        DateTime::from(self.start_date)
    }

    /// When the activity would end
    pub async fn end_date(&self) -> DateTime {
        DateTime::from(self.end_date)
    }

    /// When the request was submitted
    pub async fn created_at(&self) -> DateTime {
        DateTime::from(self.created_at)
    }

    pub async fn updated_at(&self) -> DateTime {
        DateTime::from(self.updated_at)
    }
}

impl Record for ScheduleRequest {
    const COLLECTION: Collection = Collection::ScheduleRequests;
}

#[derive(InputObject)]
pub struct NewScheduleRequest {
    pub title: String,
    pub description: Option<String>,
    pub r#type: Option<String>,
    pub start_date: DateTime,
    pub end_date: DateTime,
    pub location: Option<String>,
    pub requester_name: String,
    pub requester_email: Option<String>,
    pub requester_phone: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleRequestFields {
    title: String,
    description: Option<String>,
    r#type: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    end_date: OffsetDateTime,
    location: Option<String>,
    requester_name: String,
    requester_email: Option<String>,
    requester_phone: Option<String>,
    status: ScheduleRequestStatus,
    activity: Option<Uuid>,
}

impl NewScheduleRequest {
    fn validate(self) -> AgendaResult<ScheduleRequestFields> {
        ensure_ordered(self.start_date.0, self.end_date.0)?;
        let requester_email = optional(self.requester_email);
        if let Some(email) = &requester_email {
            ensure_valid_email(email)?;
        }

        Ok(ScheduleRequestFields {
            title: required("Title", &self.title)?,
            description: optional(self.description),
            r#type: optional(self.r#type),
            start_date: self.start_date.0,
            end_date: self.end_date.0,
            location: optional(self.location),
            requester_name: required("Requester name", &self.requester_name)?,
            requester_email,
            requester_phone: optional(self.requester_phone),
            status: ScheduleRequestStatus::Pending,
            activity: None,
        })
    }
}

impl ScheduleRequest {
    pub async fn with_id(id: Uuid, store: &Store) -> AgendaResult<Self> {
        let document = store.get_or_not_found(Self::COLLECTION, id).await?;
        Self::from_document(document)
    }

    /// All schedule requests, newest first.
    pub async fn all(
        status: Option<ScheduleRequestStatus>,
        store: &Store,
    ) -> AgendaResult<Vec<Self>> {
        let documents = store.list(Self::COLLECTION).await?;
        let mut requests = Self::from_documents(documents)?;
        if let Some(status) = status {
            requests.retain(|request| request.status == status);
        }
        requests.sort_by_key(|request| request.created_at);
        requests.reverse();

        Ok(requests)
    }

    #[tracing::instrument(skip_all, err)]
    pub async fn submit(new_request: NewScheduleRequest, store: &Store) -> AgendaResult<Self> {
        let fields = new_request.validate()?;
        let document = store
            .insert(Self::COLLECTION, into_fields(serde_json::to_value(fields)?)?)
            .await?;
        tracing::info!(id = %document.id, "schedule request submitted");

        Self::from_document(document)
    }

    pub async fn set_status(
        id: Uuid,
        status: ScheduleRequestStatus,
        store: &Store,
    ) -> AgendaResult<Self> {
        match status {
            ScheduleRequestStatus::Approved => Self::approve(id, store).await,
            ScheduleRequestStatus::Rejected => Self::reject(id, store).await,
            ScheduleRequestStatus::Pending => {
                let request = Self::with_id(id, store).await?;
                if request.status == status {
                    Ok(request)
                } else {
                    Err(AgendaError::InvalidTransition {
                        from: request.status,
                        to: status,
                    })
                }
            }
        }
    }

    /// Creates an activity from a pending request and marks it approved.
    /// Approving an approved request returns it unchanged.
    #[tracing::instrument(skip(store), err)]
    pub async fn approve(id: Uuid, store: &Store) -> AgendaResult<Self> {
        let request = Self::with_id(id, store).await?;
        if !request.ensure_can_become(ScheduleRequestStatus::Approved)? {
            return Ok(request);
        }

        let activity = Activity::create_from_fields(request.activity_fields(), store).await?;
        let document = store
            .update(
                Self::COLLECTION,
                id,
                into_fields(json!({
                    "status": ScheduleRequestStatus::Approved,
                    "activity": activity.id,
                }))?,
            )
            .await?;
        tracing::info!(%id, activity = %activity.id, "schedule request approved");

        Self::from_document(document)
    }

    #[tracing::instrument(skip(store), err)]
    pub async fn reject(id: Uuid, store: &Store) -> AgendaResult<Self> {
        let request = Self::with_id(id, store).await?;
        if !request.ensure_can_become(ScheduleRequestStatus::Rejected)? {
            return Ok(request);
        }

        let document = store
            .update(
                Self::COLLECTION,
                id,
                into_fields(json!({ "status": ScheduleRequestStatus::Rejected }))?,
            )
            .await?;
        tracing::info!(%id, "schedule request rejected");

        Self::from_document(document)
    }

    #[tracing::instrument(skip(store), err)]
    pub async fn delete(id: Uuid, store: &Store) -> AgendaResult<()> {
        store.delete(Self::COLLECTION, id).await?;
        tracing::info!(%id, "schedule request deleted");

        Ok(())
    }

    /// Whether moving to `status` changes anything; only pending requests move.
    fn ensure_can_become(&self, status: ScheduleRequestStatus) -> AgendaResult<bool> {
        match self.status {
            current if current == status => Ok(false),
            ScheduleRequestStatus::Pending => Ok(true),
            current => Err(AgendaError::InvalidTransition {
                from: current,
                to: status,
            }),
        }
    }

    fn activity_fields(&self) -> ActivityFields {
        ActivityFields {
            title: self.title.clone(),
            description: self.description.clone().unwrap_or_default(),
            r#type: self.r#type.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            location: self.location.clone().unwrap_or_default(),
            is_public: true,
            participant: Some(self.requester_name.clone()),
            district: None,
        }
    }
}
