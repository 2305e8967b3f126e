use async_graphql::{Context, Guard, Request, Schema};

use crate::config::Config;
use crate::error::AgendaResult;
use crate::models::session::{Admin, Sessions};
use crate::store::Store;

use self::mutation::MutationRoot;
use self::query::QueryRoot;
use self::subscription::SubscriptionRoot;

pub mod mutation;
pub mod query;
pub mod subscription;

/// The header (and websocket init payload key) carrying the session token.
pub const TOKEN_HEADER: &str = "AGENDA_TOKEN";
pub const TOKEN_PAYLOAD_KEY: &str = "token";

pub type AgendaSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

pub fn build_schema(store: Store, config: Config, sessions: Sessions) -> AgendaSchema {
    Schema::build(QueryRoot, MutationRoot, SubscriptionRoot)
        .data(store)
        .data(config)
        .data(sessions)
        .finish()
}

/// Attaches the admin behind `token`, if any, to the request.
pub fn authorize(
    request: Request,
    token: Option<&str>,
    sessions: &Sessions,
) -> AgendaResult<Request> {
    Ok(match token {
        Some(token) => request.data(sessions.admin_for_token(token)?),
        None => request,
    })
}

pub fn is_admin(ctx: &Context<'_>) -> bool {
    ctx.data_opt::<Admin>().is_some()
}

pub struct AdminOnly;

#[async_trait::async_trait]
impl Guard for AdminOnly {
    async fn check(&self, ctx: &Context<'_>) -> async_graphql::Result<()> {
        if is_admin(ctx) {
            Ok(())
        } else {
            Err("Admin login required".into())
        }
    }
}
