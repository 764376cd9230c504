use chrono::{DateTime, Utc};
use common::{IngestReport, SummaryStats};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::upload;

/// One entry of an upload history.
#[derive(Serialize, utoipa::ToSchema)]
pub struct HistoryEntry {
    #[schema(example = 17)]
    pub id: i32,
    /// Name of the backing file in upload storage.
    #[schema(example = "0193a1c2d3e47f6a8b9c0d1e2f3a4b5c_readings.csv")]
    pub file_name: String,
    /// Filename sent by the client.
    #[schema(example = "readings.csv")]
    pub original_name: String,
    pub uploaded_at: DateTime<Utc>,
    /// Number of data rows in the file.
    #[schema(example = 3)]
    pub total_records: i64,
}

impl From<upload::Model> for HistoryEntry {
    fn from(model: upload::Model) -> Self {
        Self {
            id: model.id,
            file_name: model.file_name,
            original_name: model.original_name,
            uploaded_at: model.uploaded_at,
            total_records: model.total_records,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HistoryListResponse {
    /// Newest first.
    pub history: Vec<HistoryEntry>,
    pub total: u64,
}

impl From<Vec<upload::Model>> for HistoryListResponse {
    fn from(models: Vec<upload::Model>) -> Self {
        let history: Vec<HistoryEntry> = models.into_iter().map(HistoryEntry::from).collect();
        Self {
            total: history.len() as u64,
            history,
        }
    }
}

/// Query parameters for listing upload history.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct HistoryListQuery {
    /// Number of entries to return, clamped to 1-5. Default: 5.
    #[param(example = 5)]
    pub limit: Option<u64>,
}

/// Result of a successful upload.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    pub record: HistoryEntry,
    pub stats: SummaryStats,
    /// Column names in file order, `Status` included.
    #[schema(example = json!(["Type", "Pressure", "Temperature", "Status"]))]
    pub columns: Vec<String>,
    /// Enriched rows keyed by column name.
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<Map<String, Value>>,
    /// The uploader's history after retention, newest first.
    pub history: Vec<HistoryEntry>,
}

impl UploadResponse {
    pub fn new(record: upload::Model, report: IngestReport, history: Vec<upload::Model>) -> Self {
        Self {
            record: record.into(),
            stats: report.stats,
            columns: report.columns,
            rows: report.rows,
            history: history.into_iter().map(HistoryEntry::from).collect(),
        }
    }
}

/// A history record replayed from its backing file.
#[derive(Serialize, utoipa::ToSchema)]
pub struct HistoryDetailResponse {
    pub record: HistoryEntry,
    /// Statistics as computed at upload time.
    pub stats: SummaryStats,
    pub columns: Vec<String>,
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<Map<String, Value>>,
}

impl HistoryDetailResponse {
    pub fn new(record: upload::Model, report: IngestReport) -> Self {
        Self {
            record: record.into(),
            stats: report.stats,
            columns: report.columns,
            rows: report.rows,
        }
    }
}
