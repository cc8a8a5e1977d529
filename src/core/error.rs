use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HemicycleError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),
    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),
    #[error("{}: row {row} has {got} columns (expected {expected})", .file.display())]
    SchemaMismatch {
        file: PathBuf,
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("Data integrity violation: {0}")]
    DataIntegrity(String),
    #[error("Unexpected format: {0}")]
    UnexpectedFormat(String),
}
