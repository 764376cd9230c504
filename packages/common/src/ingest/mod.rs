//! Upload ingest: CSV parse, per-row health classification and aggregate
//! statistics.
//!
//! [`ingest`] is pure. Running it twice over the same bytes yields the same
//! report, which is what history replay relies on.

mod error;
mod stats;
mod status;
mod table;

use serde::Serialize;
use serde_json::{Map, Number, Value};

pub use error::IngestError;
pub use stats::{SummaryStats, round2};
pub use status::{
    CRITICAL_PRESSURE, CRITICAL_TEMPERATURE, HealthStatus, ParseHealthStatusError,
    WARNING_PRESSURE,
};
pub use table::{ColumnKind, Table, parse_number};

pub const PRESSURE_COLUMN: &str = "Pressure";
pub const TEMPERATURE_COLUMN: &str = "Temperature";
pub const TYPE_COLUMN: &str = "Type";
pub const STATUS_COLUMN: &str = "Status";

/// One enriched output row, keyed by column name in header order.
pub type Row = Map<String, Value>;

/// Enriched rows plus statistics for one CSV file.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// Column names in output order, `Status` included.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub stats: SummaryStats,
}

impl IngestReport {
    /// Status of every row, in row order.
    pub fn statuses(&self) -> Vec<HealthStatus> {
        self.rows
            .iter()
            .filter_map(|row| row.get(STATUS_COLUMN)?.as_str()?.parse().ok())
            .collect()
    }
}

/// Parse raw CSV bytes and produce the enriched rows and statistics.
pub fn ingest(bytes: &[u8]) -> Result<IngestReport, IngestError> {
    let table = Table::parse(bytes)?;
    let statuses = classify(&table);
    let stats = SummaryStats::compute(&table);

    let status_index = table.column_index(STATUS_COLUMN);
    let mut columns = table.columns.clone();
    if status_index.is_none() {
        columns.push(STATUS_COLUMN.to_string());
    }

    let kinds: Vec<ColumnKind> = (0..table.columns.len())
        .map(|column| table.column_kind(column))
        .collect();

    let rows = table
        .rows
        .iter()
        .zip(statuses)
        .map(|(cells, status)| {
            let mut row = Row::new();
            for (column, name) in table.columns.iter().enumerate() {
                let value = if Some(column) == status_index {
                    Value::String(status.as_str().to_string())
                } else {
                    cell_json(cells[column].as_deref(), kinds[column])
                };
                row.insert(name.clone(), value);
            }
            if status_index.is_none() {
                row.insert(
                    STATUS_COLUMN.to_string(),
                    Value::String(status.as_str().to_string()),
                );
            }
            row
        })
        .collect();

    Ok(IngestReport {
        columns,
        rows,
        stats,
    })
}

/// Classify every row. Without both measurement columns every row is `UNKNOWN`.
fn classify(table: &Table) -> Vec<HealthStatus> {
    let (Some(pressure), Some(temperature)) = (
        table.column_index(PRESSURE_COLUMN),
        table.column_index(TEMPERATURE_COLUMN),
    ) else {
        return vec![HealthStatus::Unknown; table.rows.len()];
    };

    (0..table.rows.len())
        .map(|row| {
            HealthStatus::classify(
                table.number(row, pressure).unwrap_or(0.0),
                table.number(row, temperature).unwrap_or(0.0),
            )
        })
        .collect()
}

/// Missing cells render as `""`; numeric columns keep their numbers.
fn cell_json(cell: Option<&str>, kind: ColumnKind) -> Value {
    let Some(cell) = cell else {
        return Value::String(String::new());
    };

    let number = match kind {
        ColumnKind::Integer => cell.trim().parse::<i64>().ok().map(Number::from),
        ColumnKind::Float => parse_number(cell).and_then(Number::from_f64),
        ColumnKind::Text => None,
    };
    number.map_or_else(|| Value::String(cell.to_string()), Value::Number)
}
