use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::table::Table;
use super::{PRESSURE_COLUMN, TEMPERATURE_COLUMN, TYPE_COLUMN};

/// Aggregate statistics for one upload.
///
/// Persisted on the upload record and returned verbatim on replay.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SummaryStats {
    /// Number of data rows.
    #[schema(example = 3)]
    pub total_count: u64,
    /// Mean `Pressure`, rounded to 2 decimal places; `0` without the column.
    #[schema(example = 566.67)]
    pub avg_pressure: f64,
    /// Mean `Temperature`, rounded to 2 decimal places; `0` without the column.
    #[schema(example = 166.67)]
    pub avg_temp: f64,
    /// Row count per distinct `Type`; empty without the column.
    #[schema(example = json!({"Pump": 2, "Valve": 1}))]
    pub type_distribution: BTreeMap<String, u64>,
}

impl SummaryStats {
    pub fn compute(table: &Table) -> Self {
        Self {
            total_count: table.rows.len() as u64,
            avg_pressure: column_mean(table, PRESSURE_COLUMN),
            avg_temp: column_mean(table, TEMPERATURE_COLUMN),
            type_distribution: value_counts(table, TYPE_COLUMN),
        }
    }
}

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn column_mean(table: &Table, name: &str) -> f64 {
    let Some(column) = table.column_index(name) else {
        return 0.0;
    };

    let (sum, count) = (0..table.rows.len())
        .filter_map(|row| table.number(row, column))
        .fold((0.0, 0u64), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        0.0
    } else {
        round2(sum / count as f64)
    }
}

fn value_counts(table: &Table, name: &str) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    let Some(column) = table.column_index(name) else {
        return counts;
    };

    for value in table.rows.iter().filter_map(|row| row[column].as_deref()) {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    counts
}
