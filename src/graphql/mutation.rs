use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use crate::graphql::AdminOnly;
use crate::models::activity::{Activity, ActivityUpdate, NewActivity};
use crate::models::schedule_request::{
    NewScheduleRequest, ScheduleRequest, ScheduleRequestStatus,
};
use crate::models::session::{Admin, Sessions};
use crate::models::static_data::{self, ActivityType, District, Participant};
use crate::store::Store;

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Gets a session token for the admin on successful login
    pub async fn login(&self, ctx: &Context<'_>, email: String, password: String) -> Result<Uuid> {
        let sessions: &Sessions = ctx.data_unchecked();
        Ok(sessions.login(&email, &password)?)
    }

    /// Ends the current session
    #[graphql(guard = "AdminOnly")]
    pub async fn logout(&self, ctx: &Context<'_>) -> Result<bool> {
        let admin = ctx.data::<Admin>()?;
        let sessions: &Sessions = ctx.data_unchecked();
        Ok(sessions.logout(admin.token))
    }

    #[graphql(guard = "AdminOnly")]
    pub async fn create_activity(
        &self,
        ctx: &Context<'_>,
        new_activity: NewActivity,
    ) -> Result<Activity> {
        let store: &Store = ctx.data_unchecked();
        Ok(Activity::create(new_activity, store).await?)
    }

    #[graphql(guard = "AdminOnly")]
    pub async fn update_activity(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        update: ActivityUpdate,
    ) -> Result<Activity> {
        let store: &Store = ctx.data_unchecked();
        Ok(Activity::update(id, update, store).await?)
    }

    /// Deletes an activity and returns its ID
    #[graphql(guard = "AdminOnly")]
    pub async fn delete_activity(&self, ctx: &Context<'_>, id: Uuid) -> Result<Uuid> {
        let store: &Store = ctx.data_unchecked();
        Activity::delete(id, store).await?;

        Ok(id)
    }

    /// Asks the admins to put an activity on the calendar
    pub async fn submit_schedule_request(
        &self,
        ctx: &Context<'_>,
        request: NewScheduleRequest,
    ) -> Result<ScheduleRequest> {
        let store: &Store = ctx.data_unchecked();
        Ok(ScheduleRequest::submit(request, store).await?)
    }

    /// Creates an activity from a pending request
    #[graphql(guard = "AdminOnly")]
    pub async fn approve_schedule_request(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
    ) -> Result<ScheduleRequest> {
        let store: &Store = ctx.data_unchecked();
        Ok(ScheduleRequest::approve(id, store).await?)
    }

    #[graphql(guard = "AdminOnly")]
    pub async fn reject_schedule_request(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
    ) -> Result<ScheduleRequest> {
        let store: &Store = ctx.data_unchecked();
        Ok(ScheduleRequest::reject(id, store).await?)
    }

    #[graphql(guard = "AdminOnly")]
    pub async fn set_schedule_request_status(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        status: ScheduleRequestStatus,
    ) -> Result<ScheduleRequest> {
        let store: &Store = ctx.data_unchecked();
        Ok(ScheduleRequest::set_status(id, status, store).await?)
    }

    #[graphql(guard = "AdminOnly")]
    pub async fn delete_schedule_request(&self, ctx: &Context<'_>, id: Uuid) -> Result<Uuid> {
        let store: &Store = ctx.data_unchecked();
        ScheduleRequest::delete(id, store).await?;

        Ok(id)
    }

    #[graphql(guard = "AdminOnly")]
    pub async fn add_activity_type(&self, ctx: &Context<'_>, name: String) -> Result<ActivityType> {
        let store: &Store = ctx.data_unchecked();
        Ok(static_data::add::<ActivityType>(&name, store).await?)
    }

    #[graphql(guard = "AdminOnly")]
    pub async fn delete_activity_type(&self, ctx: &Context<'_>, id: Uuid) -> Result<Uuid> {
        let store: &Store = ctx.data_unchecked();
        static_data::delete::<ActivityType>(id, store).await?;

        Ok(id)
    }

    #[graphql(guard = "AdminOnly")]
    pub async fn add_participant(&self, ctx: &Context<'_>, name: String) -> Result<Participant> {
        let store: &Store = ctx.data_unchecked();
        Ok(static_data::add::<Participant>(&name, store).await?)
    }

    #[graphql(guard = "AdminOnly")]
    pub async fn delete_participant(&self, ctx: &Context<'_>, id: Uuid) -> Result<Uuid> {
        let store: &Store = ctx.data_unchecked();
        static_data::delete::<Participant>(id, store).await?;

        Ok(id)
    }

    #[graphql(guard = "AdminOnly")]
    pub async fn add_district(&self, ctx: &Context<'_>, name: String) -> Result<District> {
        let store: &Store = ctx.data_unchecked();
        Ok(static_data::add::<District>(&name, store).await?)
    }

    #[graphql(guard = "AdminOnly")]
    pub async fn delete_district(&self, ctx: &Context<'_>, id: Uuid) -> Result<Uuid> {
        let store: &Store = ctx.data_unchecked();
        static_data::delete::<District>(id, store).await?;

        Ok(id)
    }
}
