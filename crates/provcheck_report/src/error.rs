//! Error types for the report module.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors that can occur while building, writing or reading a report.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {from} to {to}: {message}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        message: String,
    },

    #[error("No report metadata found at: {0}")]
    MissingMetadata(PathBuf),

    #[error("Invalid schema document: {0}")]
    InvalidSchema(String),

    #[error("Language {0} recorded on a report without a schema")]
    LanguageWithoutSchema(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
