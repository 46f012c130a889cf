//! Error types for the catalog runtime.

use exercise_core::{RecordError, VerifyError};
use thiserror::Error;

/// Result type alias using CatalogError.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Failures of a record source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend error: {status} fetching {url}")]
    Backend { status: u16, url: String },

    #[error("File system error: {path}: {source}")]
    FileSystem {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing entry: {0}")]
    Missing(String),

    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Catalog-level failures reported to the session and its presenter.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Manifest unavailable: {0}")]
    Manifest(#[source] SourceError),

    #[error("Failed to load record {id}: {source}")]
    Record {
        id: String,
        #[source]
        source: SourceError,
    },

    #[error("Unknown record: {0}")]
    UnknownRecord(String),

    #[error("Record {exercise_id} has no question {question_id}")]
    UnknownQuestion {
        exercise_id: String,
        question_id: String,
    },

    #[error(transparent)]
    Verify(#[from] VerifyError),
}
