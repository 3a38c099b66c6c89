//! Language toolchains.
//!
//! A toolchain knows how to generate an SDK for one language from a schema
//! and how to build the result. The stock implementation,
//! [`GenSdkToolchain`], generates through the host tool's `gen-sdk` entry
//! point and builds with a configurable command run inside the SDK.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::{info, warn};

use provcheck_report::sanitize_segment;
use provcheck_runner::{Cancellation, CommandSpec};

use crate::host::HostTool;

/// Outcome of SDK generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    /// Where the SDK tree was (or would have been) written
    pub sdk_path: PathBuf,
    /// Stderr of the generator
    pub diagnostics: Vec<u8>,
    /// Why generation failed, if it did
    pub error: Option<String>,
}

/// Outcome of an SDK build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Built {
    /// The build invocation, as run
    pub command: String,
    /// Stderr of the build
    pub diagnostics: Vec<u8>,
    /// Why the build failed, if it did
    pub error: Option<String>,
}

/// Generate-and-build capability for one target language.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LanguageToolchain: Send + Sync {
    /// Generate an SDK from the schema at `schema_path` somewhere under
    /// `scratch_dir`.
    async fn generate(
        &self,
        schema_path: &Path,
        scratch_dir: &Path,
        cancel: &Cancellation,
    ) -> Generated;

    /// Build the SDK generated at `sdk_path`.
    async fn build(&self, sdk_path: &Path, cancel: &Cancellation) -> Built;

    /// Human-readable build invocation, for listings.
    fn build_command(&self) -> String;
}

/// Toolchain that generates with `<tool> package gen-sdk` and builds with a
/// fixed command.
#[derive(Debug, Clone)]
pub struct GenSdkToolchain {
    language: String,
    host: HostTool,
    build: Vec<String>,
}

impl GenSdkToolchain {
    /// `build` is the program followed by its arguments.
    pub fn new(language: impl Into<String>, host: HostTool, build: Vec<String>) -> Self {
        Self {
            language: language.into(),
            host,
            build,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    fn build_spec(&self, sdk_path: &Path) -> Option<CommandSpec> {
        let (program, args) = self.build.split_first()?;
        Some(
            CommandSpec::new(program)
                .args(args.iter().cloned())
                .workdir(sdk_path)
                .timeout(self.host.timeout_seconds()),
        )
    }
}

#[async_trait]
impl LanguageToolchain for GenSdkToolchain {
    async fn generate(
        &self,
        schema_path: &Path,
        scratch_dir: &Path,
        cancel: &Cancellation,
    ) -> Generated {
        let out_dir = scratch_dir.join(sanitize_segment(&self.language));
        let sdk_path = out_dir.join(&self.language);
        let spec = self.host.gen_sdk_command(schema_path, &self.language, &out_dir);

        let (diagnostics, error) = match self.host.run(&spec, cancel).await {
            Ok(result) => {
                let error = result.failure().map(|e| e.to_string());
                (result.stderr, error)
            }
            Err(e) => (Vec::new(), Some(e.to_string())),
        };

        let error = match error {
            None if !sdk_path.is_dir() => {
                Some(format!("generator produced no SDK at {}", sdk_path.display()))
            }
            other => other,
        };

        match &error {
            None => info!("[{}] Generated SDK at {:?}", self.language, sdk_path),
            Some(e) => warn!("[{}] SDK generation failed: {}", self.language, e),
        }

        Generated {
            sdk_path,
            diagnostics,
            error,
        }
    }

    async fn build(&self, sdk_path: &Path, cancel: &Cancellation) -> Built {
        let Some(spec) = self.build_spec(sdk_path) else {
            return Built {
                command: String::new(),
                diagnostics: Vec::new(),
                error: Some("no build command configured".to_string()),
            };
        };
        let command = spec.display();
        info!("[{}] Building with `{}`", self.language, command);

        let (diagnostics, error) = match self.host.runner().run(&spec, cancel).await {
            Ok(result) => {
                let error = result.failure().map(|e| e.to_string());
                (result.stderr, error)
            }
            Err(e) => (Vec::new(), Some(e.to_string())),
        };

        match &error {
            None => info!("[{}] Build succeeded", self.language),
            Some(e) => warn!("[{}] Build failed: {}", self.language, e),
        }

        Built {
            command,
            diagnostics,
            error,
        }
    }

    fn build_command(&self) -> String {
        self.build.join(" ")
    }
}

/// Built-in languages and their build commands.
pub fn presets() -> Vec<(&'static str, Vec<String>)> {
    let cmd = |parts: &[&str]| parts.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    vec![
        ("dotnet", cmd(&["dotnet", "build"])),
        ("go", cmd(&["go", "build", "./..."])),
        ("nodejs", cmd(&["npm", "install"])),
        ("python", cmd(&["python3", "-m", "compileall", "-q", "."])),
    ]
}
