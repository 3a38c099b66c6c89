//! Command runner trait and types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cancel::Cancellation;
use crate::config::CommandSpec;
use crate::error::{RunnerError, RunnerResult};

/// How a child process came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Exited on its own with this code
    Exited(i32),
    /// Killed by a signal we did not send
    Signaled,
    /// Killed because the run was cancelled
    Cancelled,
    /// Killed because the command's timeout elapsed
    TimedOut,
}

/// Result of a command execution.
///
/// Captures both streams independently, whatever the outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Program that was run
    pub program: String,
    /// How the process ended
    pub termination: Termination,
    /// Captured stdout
    pub stdout: Vec<u8>,
    /// Captured stderr
    pub stderr: Vec<u8>,
    /// Execution start time
    pub started_at: DateTime<Utc>,
    /// Execution end time
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Timeout that was in effect, in seconds
    pub timeout_seconds: u64,
}

impl ExecutionResult {
    /// Check if execution was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.termination == Termination::Exited(0)
    }

    /// Exit code, when the process exited on its own.
    pub fn exit_code(&self) -> Option<i32> {
        match self.termination {
            Termination::Exited(code) => Some(code),
            _ => None,
        }
    }

    /// The failure this result represents, if any.
    pub fn failure(&self) -> Option<RunnerError> {
        match self.termination {
            Termination::Exited(0) => None,
            Termination::Exited(code) => Some(RunnerError::NonZeroExit {
                program: self.program.clone(),
                code,
            }),
            Termination::Signaled => Some(RunnerError::Terminated(self.program.clone())),
            Termination::Cancelled => Some(RunnerError::Cancelled(self.program.clone())),
            Termination::TimedOut => Some(RunnerError::Timeout(self.timeout_seconds)),
        }
    }

    /// Stdout as lossy UTF-8.
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr as lossy UTF-8.
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Command runner trait.
///
/// `Err` is reserved for commands that could not be run at all (spawn
/// failure, broken pipes). Anything that ran is reported as an
/// [`ExecutionResult`], including non-zero exits, cancellation and timeout.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion or until `cancel` fires.
    async fn run(&self, spec: &CommandSpec, cancel: &Cancellation)
        -> RunnerResult<ExecutionResult>;
}
