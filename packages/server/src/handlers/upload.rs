use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::ingest;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Uploader;
use crate::history::{HistoryStore, RETENTION_WINDOW};
use crate::models::upload::UploadResponse;
use crate::state::AppState;
use crate::utils::filename::validate_upload_filename;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let max_file = usize::try_from(max_upload_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(max_file.saturating_add(MULTIPART_OVERHEAD))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Uploads",
    operation_id = "uploadReadings",
    summary = "Upload a CSV of equipment readings",
    description = "Parses the `file` multipart field as CSV, classifies every row as CRITICAL, \
        WARNING, OK or UNKNOWN, and records the upload in the caller's history. Only the five \
        most recent uploads per owner are kept; older records and their files are removed.",
    request_body(content_type = "multipart/form-data", description = "CSV file in the `file` field"),
    responses(
        (status = 201, description = "Upload processed", body = UploadResponse),
        (status = 400, description = "Bad upload (NO_FILE_PROVIDED, INVALID_CSV, VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, uploader, multipart), fields(owner = ?uploader.owner_id()))]
pub async fn upload_readings(
    uploader: Uploader,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let Some(file_name) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
        file = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) = file.ok_or(AppError::NoFileProvided)?;
    if file_name.trim().is_empty() {
        return Err(AppError::NoFileProvided);
    }
    let original_name = validate_upload_filename(&file_name)
        .map_err(|e| AppError::Validation(e.message().into()))?
        .to_string();

    let report = ingest(&bytes)?;

    let stored = state.uploads.put(&original_name, &bytes).await?;

    let owner = uploader.owner_id();
    let history = HistoryStore::from_state(&state);
    let record = history
        .record(owner, &stored, &original_name, &report.stats)
        .await?;
    let recent = history.list_recent(owner, RETENTION_WINDOW).await?;

    info!(
        record_id = record.id,
        file_name = %record.file_name,
        rows = report.stats.total_count,
        "Upload recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse::new(record, report, recent)),
    ))
}
