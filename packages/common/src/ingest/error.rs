use thiserror::Error;

/// Reasons an uploaded file could not be read as a table.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("No columns to parse from file")]
    NoColumns,

    #[error("Error tokenizing data. Expected {expected} fields in line {line}, saw {found}")]
    Tokenize {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("{0}")]
    Csv(#[from] csv::Error),
}
