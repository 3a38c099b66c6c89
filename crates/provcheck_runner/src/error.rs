//! Error types for the runner module.

use thiserror::Error;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur while running an external command.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to spawn {program}: {message}")]
    SpawnFailed { program: String, message: String },

    #[error("{program} exited with code {code}")]
    NonZeroExit { program: String, code: i32 },

    #[error("{0} was terminated by a signal")]
    Terminated(String),

    #[error("{0} was cancelled")]
    Cancelled(String),

    #[error("Command timeout after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunnerError {
    /// Whether this error came from the run's cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}
