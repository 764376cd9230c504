use common::storage::{ContentHash, UploadStore};
use common::{IngestReport, ingest};

use crate::entity::upload;
use crate::error::AppError;

/// Rebuild the enriched rows of a stored upload.
///
/// Rows and statuses are derived again from the backing file; the statistics
/// are the ones persisted when the file was uploaded.
pub async fn replay(
    files: &dyn UploadStore,
    record: &upload::Model,
) -> Result<IngestReport, AppError> {
    let bytes = files.get(&record.file_name).await?;

    let digest = ContentHash::from_hex(&record.content_hash)?;
    if !digest.matches(&bytes) {
        return Err(AppError::Internal(format!(
            "backing file {} of upload {} does not match its recorded digest",
            record.file_name, record.id
        )));
    }

    let fresh = ingest(&bytes).map_err(|e| {
        AppError::Internal(format!(
            "backing file {} of upload {} no longer parses: {e}",
            record.file_name, record.id
        ))
    })?;

    let stats = record.stats().map_err(|e| {
        AppError::Internal(format!("stats of upload {} are unreadable: {e}", record.id))
    })?;

    Ok(IngestReport {
        columns: fresh.columns,
        rows: fresh.rows,
        stats,
    })
}
