// Custom Error types live here

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

/// Field name to human readable messages, serialized as the body of a 400
pub type FieldErrors = BTreeMap<String, Vec<String>>;

// key used for problems with the payload as a whole rather than one field
const SCHEMA_KEY: &str = "_schema";

const UNKNOWN_RESOURCE: &str = "The requested URL was not found on the server.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid fields: {}", field_names(.0))]
pub struct ValidationError(pub FieldErrors);

fn field_names(errors: &FieldErrors) -> String {
    errors.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

impl ValidationError {
    /// The body was not a JSON object
    pub fn invalid_input() -> Self {
        Self(FieldErrors::from([(
            SCHEMA_KEY.to_owned(),
            vec!["Invalid input type.".to_owned()],
        )]))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("music record {0} not found")]
    NotFound(i64),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Everything a request handler can fail with
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{}", UNKNOWN_RESOURCE)]
    UnknownResource,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(ValidationError(errors)) => {
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            Self::Store(err @ StoreError::NotFound(_)) => {
                debug!(%err, "lookup missed");
                message(StatusCode::NOT_FOUND, &err.to_string())
            }
            Self::UnknownResource => message(StatusCode::NOT_FOUND, UNKNOWN_RESOURCE),
            Self::Store(err) => {
                // datastore details stay in the log
                error!(%err, "request failed");
                message(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}

fn message(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}
