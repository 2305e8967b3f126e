//! Live views: each subscription sends the whole current list when it
//! starts and again whenever its collection changes.

use std::future::Future;

use async_graphql::{Context, Result, Subscription};
use futures_util::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;

use crate::config::Config;
use crate::error::AgendaResult;
use crate::graphql::{is_admin, AdminOnly};
use crate::models::activity::Activity;
use crate::models::schedule_request::{ScheduleRequest, ScheduleRequestStatus};
use crate::models::static_data::{self, ActivityType, District, Participant};
use crate::models::DateScalar;
use crate::store::{Collection, Store};

pub struct SubscriptionRoot;

/// Reloads with `load` on subscribe and after every change to `collection`.
fn watch<T, F, Fut>(store: Store, collection: Collection, load: F) -> impl Stream<Item = Result<T>>
where
    T: Send + 'static,
    F: Fn(Store) -> Fut + Send + 'static,
    Fut: Future<Output = AgendaResult<T>> + Send,
{
    let changes = store.subscribe();

    stream::unfold(
        (store, changes, load, true),
        move |(store, mut changes, load, first)| async move {
            if !first {
                loop {
                    match changes.recv().await {
                        Ok(changed) if changed == collection => break,
                        Ok(_) => continue,
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, %collection, "subscriber lagged, reloading");
                            break;
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            }

            let loaded = load(store.clone()).await.map_err(Into::into);
            Some((loaded, (store, changes, load, false)))
        },
    )
}

#[Subscription]
impl SubscriptionRoot {
    /// Activities visible to the subscriber; admins may ask for public ones only
    pub async fn activities(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = false)] public_only: bool,
    ) -> impl Stream<Item = Result<Vec<Activity>>> {
        let store: &Store = ctx.data_unchecked();
        let public_only = public_only || !is_admin(ctx);

        watch(store.clone(), Collection::Activities, move |store| async move {
            Activity::all(public_only, &store).await
        })
    }

    pub async fn activities_on_date(
        &self,
        ctx: &Context<'_>,
        date: DateScalar,
    ) -> impl Stream<Item = Result<Vec<Activity>>> {
        let store: &Store = ctx.data_unchecked();
        let offset = ctx.data_unchecked::<Config>().calendar_offset;
        let public_only = !is_admin(ctx);

        watch(store.clone(), Collection::Activities, move |store| async move {
            Activity::on_date(date.0, offset, public_only, &store).await
        })
    }

    #[graphql(guard = "AdminOnly")]
    pub async fn schedule_requests(
        &self,
        ctx: &Context<'_>,
        status: Option<ScheduleRequestStatus>,
    ) -> impl Stream<Item = Result<Vec<ScheduleRequest>>> {
        let store: &Store = ctx.data_unchecked();

        watch(store.clone(), Collection::ScheduleRequests, move |store| async move {
            ScheduleRequest::all(status, &store).await
        })
    }

    /// Requests still waiting on an admin, as shown on the public calendar
    pub async fn pending_schedule_requests(
        &self,
        ctx: &Context<'_>,
    ) -> impl Stream<Item = Result<Vec<ScheduleRequest>>> {
        let store: &Store = ctx.data_unchecked();

        watch(store.clone(), Collection::ScheduleRequests, |store| async move {
            ScheduleRequest::all(Some(ScheduleRequestStatus::Pending), &store).await
        })
    }

    pub async fn activity_types(
        &self,
        ctx: &Context<'_>,
    ) -> impl Stream<Item = Result<Vec<ActivityType>>> {
        let store: &Store = ctx.data_unchecked();

        watch(store.clone(), Collection::ActivityTypes, |store| async move {
            static_data::all::<ActivityType>(&store).await
        })
    }

    pub async fn participants(
        &self,
        ctx: &Context<'_>,
    ) -> impl Stream<Item = Result<Vec<Participant>>> {
        let store: &Store = ctx.data_unchecked();

        watch(store.clone(), Collection::Participants, |store| async move {
            static_data::all::<Participant>(&store).await
        })
    }

    pub async fn districts(&self, ctx: &Context<'_>) -> impl Stream<Item = Result<Vec<District>>> {
        let store: &Store = ctx.data_unchecked();

        watch(store.clone(), Collection::Districts, |store| async move {
            static_data::all::<District>(&store).await
        })
    }
}
