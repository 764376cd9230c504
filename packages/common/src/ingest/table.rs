use std::collections::HashMap;

use csv::StringRecord;

use super::error::IngestError;

/// Cell texts treated as missing values.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// How a column's cells are emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// No missing cells, and every cell is an integer.
    Integer,
    /// Every present cell is a finite number; emitted as floats (`2` → `2.0`).
    Float,
    Text,
}

/// A parsed CSV: de-duplicated header names and rows of optional cells,
/// each row exactly as wide as the header.
#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// Parse CSV bytes with a header row.
    pub fn parse(bytes: &[u8]) -> Result<Self, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut records = reader.records();

        let header = records.next().ok_or(IngestError::NoColumns)??;
        let columns = header_names(&header);
        if columns.is_empty() {
            return Err(IngestError::NoColumns);
        }

        let mut rows = Vec::new();
        for record in records {
            let record = record?;
            if record.len() > columns.len() {
                return Err(IngestError::Tokenize {
                    line: record.position().map(|p| p.line()).unwrap_or_default(),
                    expected: columns.len(),
                    found: record.len(),
                });
            }

            let mut row: Vec<Option<String>> = record.iter().map(cell_value).collect();
            row.resize(columns.len(), None);
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Numeric value of a cell, if it holds a finite number.
    pub fn number(&self, row: usize, column: usize) -> Option<f64> {
        self.rows[row][column].as_deref().and_then(parse_number)
    }

    pub fn column_kind(&self, column: usize) -> ColumnKind {
        let cells = self.rows.iter().map(|row| row[column].as_deref());

        let mut any_missing = false;
        let mut all_integer = true;
        for cell in cells {
            let Some(cell) = cell else {
                any_missing = true;
                continue;
            };
            if parse_number(cell).is_none() {
                return ColumnKind::Text;
            }
            all_integer &= cell.trim().parse::<i64>().is_ok();
        }

        if all_integer && !any_missing {
            ColumnKind::Integer
        } else {
            ColumnKind::Float
        }
    }
}

/// Parse a cell as a finite number.
pub fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn cell_value(raw: &str) -> Option<String> {
    if MISSING_MARKERS.contains(&raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Build header names: strip a leading BOM, name blank headers, and suffix
/// repeated names with `.1`, `.2`, ... so every name is unique.
fn header_names(header: &StringRecord) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(header.len());

    for (index, raw) in header.iter().enumerate() {
        let raw = if index == 0 {
            raw.trim_start_matches('\u{feff}')
        } else {
            raw
        };

        let base = if raw.is_empty() {
            format!("Unnamed: {index}")
        } else {
            raw.to_string()
        };

        let mut name = base.clone();
        while seen.contains_key(&name) {
            let count = {
                let count = seen.entry(base.clone()).or_insert(0);
                *count += 1;
                *count
            };
            name = format!("{base}.{count}");
        }
        seen.insert(name.clone(), 0);
        names.push(name);
    }

    names
}
