//! Error types for the core module.

use thiserror::Error;

/// Result type alias for core operations.
pub type CheckResult<T> = Result<T, CheckError>;

/// Errors that stop a validation run.
///
/// Schema and per-language failures are not errors: they are recorded in the
/// report. Only version resolution, configuration and persistence fail a run.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Unable to resolve {what}: {message}")]
    Resolution { what: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Report error: {0}")]
    Report(#[from] provcheck_report::ReportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CheckError {
    pub(crate) fn resolution(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            what: what.into(),
            message: message.into(),
        }
    }
}
