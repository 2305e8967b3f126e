//! The activity calendar's GraphQL server

use anyhow::Context as _;
use async_graphql::http::{playground_source, GraphQLPlaygroundConfig, ALL_WEBSOCKET_PROTOCOLS};
use async_graphql::{Data, Request, Response};
use async_graphql_axum::{GraphQLProtocol, GraphQLWebSocket};
use axum::extract::{Extension, WebSocketUpgrade};
use axum::headers::HeaderMap;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use agenda::config::Config;
use agenda::error::{AgendaError, AgendaResult};
use agenda::graphql::{authorize, build_schema, AgendaSchema, TOKEN_HEADER, TOKEN_PAYLOAD_KEY};
use agenda::models::session::Sessions;
use agenda::store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let store = match &config.database_url {
        Some(url) => Store::new(
            PgStore::connect(url)
                .await
                .context("Failed to connect to the database")?,
        ),
        None => {
            tracing::warn!("DATABASE_URL is not set, keeping documents in memory");
            Store::new(MemoryStore::new())
        }
    };
    let sessions = Sessions::new(config.admin.clone());
    let addr = config.addr;
    let schema = build_schema(store, config, sessions.clone());

    let app = Router::new()
        .route("/", get(playground).post(query))
        .route("/ws", get(subscribe))
        .layer(Extension(schema))
        .layer(Extension(sessions))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    tracing::info!(%addr, "serving the activity calendar");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .context("Server stopped unexpectedly")
}

async fn query(
    Extension(schema): Extension<AgendaSchema>,
    Extension(sessions): Extension<Sessions>,
    headers: HeaderMap,
    Json(request): Json<Request>,
) -> AgendaResult<Json<Response>> {
    let request = authorize(request, get_token(&headers)?, &sessions)?;

    Ok(Json(schema.execute(request).await))
}

async fn subscribe(
    Extension(schema): Extension<AgendaSchema>,
    Extension(sessions): Extension<Sessions>,
    protocol: GraphQLProtocol,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade
        .protocols(ALL_WEBSOCKET_PROTOCOLS)
        .on_upgrade(move |socket| {
            GraphQLWebSocket::new(socket, schema, protocol)
                .on_connection_init(move |payload| async move {
                    let mut data = Data::default();
                    if let Some(token) = payload.get(TOKEN_PAYLOAD_KEY).and_then(|t| t.as_str()) {
                        data.insert(sessions.admin_for_token(token)?);
                    }

                    Ok(data)
                })
                .serve()
        })
}

async fn playground(headers: HeaderMap) -> AgendaResult<Html<String>> {
    let mut config = GraphQLPlaygroundConfig::new("/").subscription_endpoint("/ws");
    if let Some(token) = get_token(&headers)? {
        config = config.with_header(TOKEN_HEADER, token);
    }

    Ok(Html(playground_source(config)))
}

fn get_token(headers: &HeaderMap) -> AgendaResult<Option<&str>> {
    headers
        .iter()
        .find_map(|(name, value)| {
            if name == TOKEN_HEADER {
                Some(value.to_str().map_err(AgendaError::InvalidTokenHeader))
            } else {
                None
            }
        })
        .transpose()
}
