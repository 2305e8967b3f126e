use async_graphql::{Context, Object, Result};
use time::Month;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AgendaError, AgendaResult};
use crate::graphql::{is_admin, AdminOnly};
use crate::models::activity::Activity;
use crate::models::calendar::{
    activities_in_month, categorize_activities, month_calendar, schedule_span, time_slots,
    year_overview, CategorizedActivities, MonthCalendar, MonthSummary, ScheduleSpan, TimeSlot,
};
use crate::models::schedule_request::{ScheduleRequest, ScheduleRequestStatus};
use crate::models::session::Admin;
use crate::models::static_data::{self, ActivityType, District, Participant};
use crate::models::{DateScalar, TimeScalar};
use crate::store::{Collection, Store};
use crate::util::current_time;

pub struct QueryRoot;

fn month_from_number(month: u8) -> AgendaResult<Month> {
    Month::try_from(month)
        .map_err(|_| AgendaError::bad_request(format!("{} is not a month number", month)))
}

/// Activities visible to the caller: everything for admins, public ones otherwise.
async fn visible_activities(ctx: &Context<'_>) -> AgendaResult<Vec<Activity>> {
    let store: &Store = ctx.data_unchecked();
    Activity::all(!is_admin(ctx), store).await
}

#[Object]
impl QueryRoot {
    /// The email of the logged-in admin, if any
    pub async fn admin(&self, ctx: &Context<'_>) -> Option<String> {
        ctx.data_opt::<Admin>().map(|admin| admin.email.clone())
    }

    pub async fn public_activities(&self, ctx: &Context<'_>) -> Result<Vec<Activity>> {
        let store: &Store = ctx.data_unchecked();
        Ok(Activity::all(true, store).await?)
    }

    #[graphql(guard = "AdminOnly")]
    pub async fn activities(&self, ctx: &Context<'_>) -> Result<Vec<Activity>> {
        let store: &Store = ctx.data_unchecked();
        Ok(Activity::all(false, store).await?)
    }

    pub async fn activity(&self, ctx: &Context<'_>, id: Uuid) -> Result<Activity> {
        let store: &Store = ctx.data_unchecked();
        let activity = Activity::with_id(id, store).await?;
        if activity.is_public || is_admin(ctx) {
            Ok(activity)
        } else {
            Err(AgendaError::NotFound {
                collection: Collection::Activities,
                id,
            }
            .into())
        }
    }

    /// Visible activities split into happening now, upcoming, and past
    pub async fn categorized_activities(
        &self,
        ctx: &Context<'_>,
    ) -> Result<CategorizedActivities> {
        let activities = visible_activities(ctx).await?;
        Ok(categorize_activities(
            activities,
            current_time(ctx.data_unchecked::<Config>().calendar_offset),
        ))
    }

    pub async fn activities_on_date(
        &self,
        ctx: &Context<'_>,
        date: DateScalar,
    ) -> Result<Vec<Activity>> {
        let store: &Store = ctx.data_unchecked();
        let config: &Config = ctx.data_unchecked();
        Ok(Activity::on_date(date.0, config.calendar_offset, !is_admin(ctx), store).await?)
    }

    pub async fn activities_in_month(
        &self,
        ctx: &Context<'_>,
        year: i32,
        month: u8,
    ) -> Result<Vec<Activity>> {
        let config: &Config = ctx.data_unchecked();
        let activities = visible_activities(ctx).await?;
        Ok(activities_in_month(
            &activities,
            year,
            month_from_number(month)?,
            config.calendar_offset,
        )?)
    }

    /// The month grid shown on the calendar page
    pub async fn month_calendar(
        &self,
        ctx: &Context<'_>,
        year: i32,
        month: u8,
    ) -> Result<MonthCalendar> {
        let config: &Config = ctx.data_unchecked();
        let activities = visible_activities(ctx).await?;
        Ok(month_calendar(
            &activities,
            year,
            month_from_number(month)?,
            config.calendar_offset,
        )?)
    }

    pub async fn year_overview(&self, ctx: &Context<'_>, year: i32) -> Result<Vec<MonthSummary>> {
        let config: &Config = ctx.data_unchecked();
        let activities = visible_activities(ctx).await?;
        Ok(year_overview(&activities, year, config.calendar_offset)?)
    }

    #[graphql(guard = "AdminOnly")]
    pub async fn schedule_requests(
        &self,
        ctx: &Context<'_>,
        status: Option<ScheduleRequestStatus>,
    ) -> Result<Vec<ScheduleRequest>> {
        let store: &Store = ctx.data_unchecked();
        Ok(ScheduleRequest::all(status, store).await?)
    }

    #[graphql(guard = "AdminOnly")]
    pub async fn schedule_request(&self, ctx: &Context<'_>, id: Uuid) -> Result<ScheduleRequest> {
        let store: &Store = ctx.data_unchecked();
        Ok(ScheduleRequest::with_id(id, store).await?)
    }

    /// Requests still waiting on an admin
    pub async fn pending_schedule_requests(
        &self,
        ctx: &Context<'_>,
    ) -> Result<Vec<ScheduleRequest>> {
        let store: &Store = ctx.data_unchecked();
        Ok(ScheduleRequest::all(Some(ScheduleRequestStatus::Pending), store).await?)
    }

    pub async fn activity_types(&self, ctx: &Context<'_>) -> Result<Vec<ActivityType>> {
        let store: &Store = ctx.data_unchecked();
        Ok(static_data::all::<ActivityType>(store).await?)
    }

    pub async fn participants(&self, ctx: &Context<'_>) -> Result<Vec<Participant>> {
        let store: &Store = ctx.data_unchecked();
        Ok(static_data::all::<Participant>(store).await?)
    }

    pub async fn districts(&self, ctx: &Context<'_>) -> Result<Vec<District>> {
        let store: &Store = ctx.data_unchecked();
        Ok(static_data::all::<District>(store).await?)
    }

    /// The start and end time choices for activity forms
    pub async fn time_slots(&self) -> Vec<TimeSlot> {
        time_slots()
    }

    /// The interval an activity would occupy given the dates picked (in
    /// order) and its daily start and end times
    pub async fn schedule_span(
        &self,
        ctx: &Context<'_>,
        dates: Vec<DateScalar>,
        start_time: TimeScalar,
        end_time: TimeScalar,
    ) -> Result<ScheduleSpan> {
        let config: &Config = ctx.data_unchecked();
        let picks: Vec<_> = dates.into_iter().map(|date| date.0).collect();
        Ok(schedule_span(
            &picks,
            start_time.0,
            end_time.0,
            config.calendar_offset,
        )?)
    }
}
