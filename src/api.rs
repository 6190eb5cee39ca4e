//! HTTP resources for the music library.
//!
//! | Method | Path                      | Success               |
//! |--------|---------------------------|-----------------------|
//! | GET    | `/api/musiclibrarys`      | 200, array of records |
//! | POST   | `/api/musiclibrarys`      | 201, created record   |
//! | GET    | `/api/musiclibrarys/{id}` | 200, record           |
//! | PUT    | `/api/musiclibrarys/{id}` | 200, updated record   |
//! | DELETE | `/api/musiclibrarys/{id}` | 204, empty body       |
//!
//! Validation failures answer 400 with a map from field name to messages,
//! unknown ids (and ids that are not integers) answer 404.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::{
    database,
    error::{ApiError, ValidationError},
    record::{MusicRecord, MusicRecordPatch, NewMusicRecord},
};

pub const COLLECTION_PATH: &str = "/api/musiclibrarys";
pub const ITEM_PATH: &str = "/api/musiclibrarys/{id}";

// extractor failures are turned into our own error bodies instead of axum's plain text ones
type JsonBody = Result<Json<Value>, JsonRejection>;
type RecordId = Result<Path<i64>, PathRejection>;

/// Builds the router around an already migrated pool
pub fn router(pool: SqlitePool) -> Router {
    Router::new()
        .route(COLLECTION_PATH, get(list_records).post(create_record))
        .route(
            ITEM_PATH,
            get(show_record).put(update_record).delete(delete_record),
        )
        .fallback(unknown_resource)
        .with_state(pool)
}

async fn list_records(State(pool): State<SqlitePool>) -> Result<Json<Vec<MusicRecord>>, ApiError> {
    Ok(Json(database::get_all_records(&pool).await?))
}

async fn create_record(
    State(pool): State<SqlitePool>,
    body: JsonBody,
) -> Result<(StatusCode, Json<MusicRecord>), ApiError> {
    let new_record = NewMusicRecord::from_json(&payload(body)?)?;
    let record = database::add_record(&pool, &new_record).await?;
    info!(id = record.id, title = %record.title, "created music record");
    Ok((StatusCode::CREATED, Json(record)))
}

async fn show_record(
    State(pool): State<SqlitePool>,
    id: RecordId,
) -> Result<Json<MusicRecord>, ApiError> {
    let id = record_id(id)?;
    Ok(Json(database::get_record(&pool, id).await?))
}

async fn update_record(
    State(pool): State<SqlitePool>,
    id: RecordId,
    body: JsonBody,
) -> Result<Json<MusicRecord>, ApiError> {
    let id = record_id(id)?;
    // an unknown id is a 404 whatever the body holds
    database::get_record(&pool, id).await?;
    let patch = MusicRecordPatch::from_json(&payload(body)?)?;
    let record = database::update_record(&pool, id, &patch).await?;
    info!(id, empty = patch.is_empty(), "updated music record");
    Ok(Json(record))
}

async fn delete_record(State(pool): State<SqlitePool>, id: RecordId) -> Result<StatusCode, ApiError> {
    let id = record_id(id)?;
    database::delete_record(&pool, id).await?;
    info!(id, "deleted music record");
    Ok(StatusCode::NO_CONTENT)
}

async fn unknown_resource() -> ApiError {
    ApiError::UnknownResource
}

fn record_id(id: RecordId) -> Result<i64, ApiError> {
    id.map(|Path(id)| id).map_err(|rejection| {
        debug!(%rejection, "not a record id");
        ApiError::UnknownResource
    })
}

fn payload(body: JsonBody) -> Result<Value, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        debug!(%rejection, "unreadable request body");
        ValidationError::invalid_input().into()
    })
}
