//! Version resolution.
//!
//! Both versions are prerequisites for a report path, so every failure here
//! is fatal to the run.

use tracing::info;

use provcheck_report::SchemaDocument;
use provcheck_runner::{Cancellation, CommandSpec, ExecutionResult};

use crate::error::{CheckError, CheckResult};
use crate::host::HostTool;

const PROVIDER: &str = "terraform-provider version";
const HOST_TOOL: &str = "host tool version";

/// Versions resolved at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersions {
    /// Version of the dynamically-bridged provider
    pub provider: String,
    /// Version of the host tool
    pub host_tool: String,
}

/// Resolves the bridged provider and host tool versions.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    host: HostTool,
}

impl VersionResolver {
    pub fn new(host: HostTool) -> Self {
        Self { host }
    }

    /// Read the `version` field of the bridged provider's own schema.
    pub async fn provider_version(&self, cancel: &Cancellation) -> CheckResult<String> {
        let result = self
            .run(PROVIDER, &self.host.provider_schema_command(None, None), cancel)
            .await?;
        let schema = SchemaDocument::from_slice(&result.stdout)
            .map_err(|e| CheckError::resolution(PROVIDER, e.to_string()))?;

        let version = schema.version().to_string();
        info!("Resolved terraform-provider version {}", version);
        Ok(version)
    }

    /// Trimmed output of `<tool> version`.
    pub async fn host_tool_version(&self, cancel: &Cancellation) -> CheckResult<String> {
        let result = self.run(HOST_TOOL, &self.host.version_command(), cancel).await?;
        let version = result.stdout_lossy().trim().to_string();
        if version.is_empty() {
            return Err(CheckError::resolution(HOST_TOOL, "empty output"));
        }

        info!("Resolved {} version {}", self.host.program(), version);
        Ok(version)
    }

    /// Resolve both versions, provider first.
    pub async fn resolve(&self, cancel: &Cancellation) -> CheckResult<ResolvedVersions> {
        Ok(ResolvedVersions {
            provider: self.provider_version(cancel).await?,
            host_tool: self.host_tool_version(cancel).await?,
        })
    }

    async fn run(
        &self,
        what: &str,
        spec: &CommandSpec,
        cancel: &Cancellation,
    ) -> CheckResult<ExecutionResult> {
        let result = self
            .host
            .run(spec, cancel)
            .await
            .map_err(|e| CheckError::resolution(what, e.to_string()))?;

        match result.failure() {
            None => Ok(result),
            Some(err) => {
                let stderr = result.stderr_lossy();
                let message = match stderr.trim() {
                    "" => err.to_string(),
                    detail => format!("{}: {}", err, detail),
                };
                Err(CheckError::resolution(what, message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use provcheck_runner::{MockResponse, MockRunner};

    fn resolver(runner: MockRunner) -> VersionResolver {
        VersionResolver::new(HostTool::new("pulumi", Arc::new(runner)))
    }

    #[tokio::test]
    async fn test_resolves_both_versions() {
        let runner = MockRunner::new()
            .on(
                "pulumi",
                &["package", "get-schema", "terraform-provider"],
                MockResponse::success(r#"{"name":"terraform-provider","version":"0.4.1"}"#),
            )
            .on("pulumi", &["version"], MockResponse::success("v3.130.0\n"));

        let versions = resolver(runner).resolve(&Cancellation::never()).await.unwrap();

        assert_eq!(versions.provider, "0.4.1");
        assert_eq!(versions.host_tool, "v3.130.0");
    }

    #[tokio::test]
    async fn test_provider_schema_not_json() {
        let runner = MockRunner::new().on(
            "pulumi",
            &["package"],
            MockResponse::success("plugin not installed"),
        );

        let err = resolver(runner)
            .provider_version(&Cancellation::never())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckError::Resolution { .. }));
    }

    #[tokio::test]
    async fn test_subprocess_failure_includes_stderr() {
        let runner = MockRunner::new().on("pulumi", &["version"], MockResponse::failure(1, "boom"));

        let err = resolver(runner)
            .host_tool_version(&Cancellation::never())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let runner = MockRunner::new().otherwise(MockResponse::spawn_error("not found"));

        let err = resolver(runner).resolve(&Cancellation::never()).await.unwrap_err();
        assert!(err.to_string().contains("terraform-provider version"));
    }

    #[tokio::test]
    async fn test_empty_version_output() {
        let runner = MockRunner::new().on("pulumi", &["version"], MockResponse::success("  \n"));

        let err = resolver(runner)
            .host_tool_version(&Cancellation::never())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty output"));
    }
}
