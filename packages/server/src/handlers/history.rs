use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Uploader;
use crate::history::{HistoryStore, RETENTION_WINDOW, replay};
use crate::models::upload::{HistoryDetailResponse, HistoryListQuery, HistoryListResponse};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "History",
    operation_id = "listHistory",
    summary = "List recent uploads",
    description = "Returns the caller's most recent uploads, newest first. At most five are kept.",
    params(HistoryListQuery),
    responses(
        (status = 200, description = "Upload history", body = HistoryListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, uploader, query), fields(owner = ?uploader.owner_id()))]
pub async fn list_history(
    uploader: Uploader,
    State(state): State<AppState>,
    Query(query): Query<HistoryListQuery>,
) -> Result<Json<HistoryListResponse>, AppError> {
    let limit = query.limit.unwrap_or(RETENTION_WINDOW);
    let records = HistoryStore::from_state(&state)
        .list_recent(uploader.owner_id(), limit)
        .await?;

    Ok(Json(HistoryListResponse::from(records)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "History",
    operation_id = "getHistoryRecord",
    summary = "Replay one upload",
    description = "Re-reads the stored file and classifies its rows again. The statistics are \
        the ones computed when the file was uploaded.",
    params(("id" = i32, Path, description = "Upload record ID")),
    responses(
        (status = 200, description = "Replayed upload", body = HistoryDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No such record for this caller (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Stored file is gone (STORAGE_MISSING)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, uploader), fields(owner = ?uploader.owner_id(), record_id = id))]
pub async fn get_history_record(
    uploader: Uploader,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<HistoryDetailResponse>, AppError> {
    let record = HistoryStore::from_state(&state)
        .get(uploader.owner_id(), id)
        .await?;
    let report = replay(&*state.uploads, &record).await?;

    Ok(Json(HistoryDetailResponse::new(record, report)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "History",
    operation_id = "deleteHistoryRecord",
    summary = "Delete one upload",
    description = "Removes the record and its stored file.",
    params(("id" = i32, Path, description = "Upload record ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No such record for this caller (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, uploader), fields(owner = ?uploader.owner_id(), record_id = id))]
pub async fn delete_history_record(
    uploader: Uploader,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    HistoryStore::from_state(&state)
        .evict(uploader.owner_id(), id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
