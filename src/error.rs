//! Error handling for the API.
//!
//! Prefer a dedicated `AgendaError` variant over squeezing a new failure
//! into `BadRequest`; each variant documents the status it maps to.

use axum::http::header::ToStrError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::models::schedule_request::ScheduleRequestStatus;
use crate::store::Collection;

/// The error enum for all error handling across the API.
#[derive(Debug, thiserror::Error)]
pub enum AgendaError {
    /// \[404\] No document with the given ID exists in the collection.
    #[error("No document in {collection} with id {id}")]
    NotFound { collection: Collection, id: Uuid },
    /// \[400\] The request was malformed or failed validation.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// \[409\] A reference list already holds this name (ignoring case).
    #[error("{collection} already contains \"{name}\"")]
    DuplicateName { collection: Collection, name: String },
    /// \[409\] Only pending schedule requests can be approved or rejected.
    #[error("Cannot change the status of a schedule request from {from} to {to}")]
    InvalidTransition {
        from: ScheduleRequestStatus,
        to: ScheduleRequestStatus,
    },
    /// \[401\] The login was rejected or the session token is unknown.
    #[error("login required")]
    Unauthorized,
    /// \[400\] The token header held non-visible ASCII.
    #[error("invalid token header: {0}")]
    InvalidTokenHeader(#[from] ToStrError),
    /// \[500\] An error occurred while talking to Postgres.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// \[500\] A stored document could not be (de)serialized.
    #[error("malformed document: {0}")]
    MalformedDocument(#[from] serde_json::Error),
    /// \[500\] The environment held an invalid setting.
    #[error("configuration error: {0}")]
    Config(String),
}

/// The return type for all fallible operations.
pub type AgendaResult<T> = Result<T, AgendaError>;

impl AgendaError {
    pub fn status(&self) -> StatusCode {
        match self {
            AgendaError::NotFound { .. } => StatusCode::NOT_FOUND,
            AgendaError::BadRequest(_) | AgendaError::InvalidTokenHeader(_) => {
                StatusCode::BAD_REQUEST
            }
            AgendaError::DuplicateName { .. } | AgendaError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            AgendaError::Unauthorized => StatusCode::UNAUTHORIZED,
            AgendaError::Database(_)
            | AgendaError::MalformedDocument(_)
            | AgendaError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        AgendaError::BadRequest(reason.into())
    }
}

impl IntoResponse for AgendaError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = json!({
            "message": self.to_string(),
            "statusCode": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
