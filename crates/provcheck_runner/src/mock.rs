//! Mock command runner for testing.
//!
//! Provides a scripted implementation of the [`CommandRunner`] trait so the
//! pipeline can be exercised without the host tool or any build toolchain.
//! Responses are matched by program name and argument prefix; every call is
//! captured for later verification.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::cancel::Cancellation;
use crate::config::CommandSpec;
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{CommandRunner, ExecutionResult, Termination};

/// Side effect run when a response is served, e.g. writing generated files.
pub type MockEffect = Arc<dyn Fn(&CommandSpec) + Send + Sync>;

/// Predefined mock response for a command execution.
#[derive(Clone)]
pub struct MockResponse {
    pub termination: Termination,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub spawn_error: Option<String>,
    pub effect: Option<MockEffect>,
}

impl MockResponse {
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            termination: Termination::Exited(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
            spawn_error: None,
            effect: None,
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            termination: Termination::Exited(exit_code),
            stdout: Vec::new(),
            stderr: stderr.into(),
            spawn_error: None,
            effect: None,
        }
    }

    /// A command that could not be started at all.
    pub fn spawn_error(message: impl Into<String>) -> Self {
        Self {
            spawn_error: Some(message.into()),
            ..Self::success("")
        }
    }

    pub fn with_stderr(mut self, stderr: impl Into<Vec<u8>>) -> Self {
        self.stderr = stderr.into();
        self
    }

    pub fn with_termination(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }

    pub fn with_effect(mut self, effect: impl Fn(&CommandSpec) + Send + Sync + 'static) -> Self {
        self.effect = Some(Arc::new(effect));
        self
    }
}

impl fmt::Debug for MockResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockResponse")
            .field("termination", &self.termination)
            .field("stdout", &String::from_utf8_lossy(&self.stdout))
            .field("stderr", &String::from_utf8_lossy(&self.stderr))
            .field("spawn_error", &self.spawn_error)
            .field("effect", &self.effect.is_some())
            .finish()
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedCall {
    pub program: String,
    pub args: Vec<String>,
    pub workdir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
struct Rule {
    program: String,
    prefix: Vec<String>,
    response: MockResponse,
}

/// Mock command runner for testing.
#[derive(Clone)]
pub struct MockRunner {
    rules: Arc<RwLock<Vec<Rule>>>,
    fallback: Arc<RwLock<MockResponse>>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    /// Create a mock runner that succeeds with empty output for any command.
    pub fn new() -> Self {
        Self {
            rules: Arc::new(RwLock::new(Vec::new())),
            fallback: Arc::new(RwLock::new(MockResponse::success(""))),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Respond to `program` invocations whose arguments start with `prefix`.
    ///
    /// Rules are tried in registration order; the first match wins.
    pub fn on(self, program: &str, prefix: &[&str], response: MockResponse) -> Self {
        self.rules.write().push(Rule {
            program: program.to_string(),
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            response,
        });
        self
    }

    /// Response for commands that match no rule.
    pub fn otherwise(self, response: MockResponse) -> Self {
        *self.fallback.write() = response;
        self
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Calls to `program` whose arguments start with `prefix`.
    pub fn calls_matching(&self, program: &str, prefix: &[&str]) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| {
                c.program == program
                    && prefix.len() <= c.args.len()
                    && c.args.iter().zip(prefix).all(|(a, p)| a == p)
            })
            .cloned()
            .collect()
    }

    fn response_for(&self, spec: &CommandSpec) -> MockResponse {
        self.rules
            .read()
            .iter()
            .find(|rule| {
                let prefix: Vec<&str> = rule.prefix.iter().map(String::as_str).collect();
                rule.program == spec.program && spec.args_start_with(&prefix)
            })
            .map(|rule| rule.response.clone())
            .unwrap_or_else(|| self.fallback.read().clone())
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(
        &self,
        spec: &CommandSpec,
        cancel: &Cancellation,
    ) -> RunnerResult<ExecutionResult> {
        self.captured_calls.write().push(CapturedCall {
            program: spec.program.clone(),
            args: spec.args.clone(),
            workdir: spec.workdir.clone(),
        });

        let response = self.response_for(spec);
        if let Some(message) = response.spawn_error {
            return Err(RunnerError::SpawnFailed {
                program: spec.program.clone(),
                message,
            });
        }

        let termination = if cancel.is_cancelled() {
            Termination::Cancelled
        } else {
            if let Some(effect) = &response.effect {
                effect(spec);
            }
            response.termination
        };

        let now = Utc::now();
        Ok(ExecutionResult {
            program: spec.program.clone(),
            termination,
            stdout: response.stdout,
            stderr: response.stderr,
            started_at: now,
            finished_at: now,
            duration_ms: 0,
            timeout_seconds: spec.timeout_seconds,
        })
    }
}
