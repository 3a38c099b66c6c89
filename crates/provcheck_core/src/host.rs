//! Host tool wrapper.
//!
//! Builds the host provisioning CLI invocations the checker depends on and
//! runs them through a [`CommandRunner`].

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use provcheck_runner::{Cancellation, CommandRunner, CommandSpec, ExecutionResult, RunnerResult};

/// Default host tool program.
pub const DEFAULT_TOOL: &str = "pulumi";

/// Arguments of the bridged provider's schema entry point.
pub const PROVIDER_SCHEMA_ARGS: [&str; 3] = ["package", "get-schema", "terraform-provider"];

/// Arguments of the self-version entry point.
pub const VERSION_ARGS: [&str; 1] = ["version"];

/// Arguments of the SDK generation entry point.
pub const GEN_SDK_ARGS: [&str; 2] = ["package", "gen-sdk"];

/// The host provisioning CLI.
#[derive(Clone)]
pub struct HostTool {
    program: String,
    runner: Arc<dyn CommandRunner>,
    timeout_seconds: u64,
}

impl HostTool {
    pub fn new(program: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
            timeout_seconds: 0,
        }
    }

    /// Bound every command started through this tool (0 = unbounded).
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    /// The runner commands are executed with.
    pub fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    /// `<tool> version`
    pub fn version_command(&self) -> CommandSpec {
        self.command(VERSION_ARGS)
    }

    /// `<tool> package get-schema terraform-provider [<source> [<version>]]`
    pub fn provider_schema_command(&self, source: Option<&str>, version: Option<&str>) -> CommandSpec {
        let mut spec = self.command(PROVIDER_SCHEMA_ARGS);
        if let Some(source) = source {
            spec = spec.arg(source);
            if let Some(version) = version.filter(|v| !v.is_empty()) {
                spec = spec.arg(version);
            }
        }
        spec
    }

    /// `<tool> package gen-sdk <schema> --language=<lang> --out=<dir>`
    pub fn gen_sdk_command(&self, schema_path: &Path, language: &str, out_dir: &Path) -> CommandSpec {
        self.command(GEN_SDK_ARGS)
            .arg(schema_path.to_string_lossy())
            .arg(format!("--language={}", language))
            .arg(format!("--out={}", out_dir.to_string_lossy()))
    }

    fn command<const N: usize>(&self, args: [&str; N]) -> CommandSpec {
        CommandSpec::new(&self.program)
            .args(args)
            .timeout(self.timeout_seconds)
    }

    /// Run a command through the tool's runner.
    pub async fn run(
        &self,
        spec: &CommandSpec,
        cancel: &Cancellation,
    ) -> RunnerResult<ExecutionResult> {
        debug!("Host tool: {}", spec.display());
        self.runner.run(spec, cancel).await
    }
}

impl fmt::Debug for HostTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostTool")
            .field("program", &self.program)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}
