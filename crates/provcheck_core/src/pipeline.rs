//! The check pipeline.
//!
//! Versions are resolved first and are fatal on failure. The schema is
//! fetched next; without one the run ends with a failure report. With one,
//! the schema is staged in the run's scratch directory and every selected
//! language is validated against it before the report is assembled.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{info, warn};

use provcheck_report::{
    to_canonical_json, LanguageReport, ProviderReport, ReportWriter, SchemaDocument,
};
use provcheck_runner::{Cancellation, CommandRunner};

use crate::config::CheckConfig;
use crate::error::{CheckError, CheckResult};
use crate::host::HostTool;
use crate::registry::LanguageRegistry;
use crate::schema::SchemaFetcher;
use crate::validator::LanguageValidator;
use crate::version::VersionResolver;

const STAGED_SCHEMA: &str = "schema.json";
const SCRATCH_PREFIX: &str = "provcheck-";

/// What to check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    /// Provider source identifier, e.g. `hashicorp/random`
    pub source: String,
    /// Pinned provider version
    pub version: Option<String>,
}

impl CheckRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Arguments handed to the schema fetch: the source, then the pinned
    /// version if there is one.
    pub fn invocation_args(&self) -> Vec<String> {
        let mut args = vec![self.source.clone()];
        if let Some(version) = self.version.as_deref().filter(|v| !v.is_empty()) {
            args.push(version.to_string());
        }
        args
    }
}

/// A completed run.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub report: ProviderReport,
    /// Directory the report was written to
    pub report_dir: PathBuf,
}

/// Drives one check from version resolution to the written report.
#[derive(Debug, Clone)]
pub struct CheckPipeline {
    host: HostTool,
    registry: Arc<LanguageRegistry>,
    languages: Vec<String>,
    report_root: PathBuf,
    parallel: bool,
}

impl CheckPipeline {
    /// A pipeline validating `dotnet` into `providers/`.
    pub fn new(host: HostTool, registry: LanguageRegistry) -> Self {
        let defaults = CheckConfig::default();
        Self {
            host,
            registry: Arc::new(registry),
            languages: defaults.languages,
            report_root: defaults.report_root,
            parallel: defaults.parallel_languages,
        }
    }

    /// Build a pipeline from configuration.
    pub fn from_config(config: &CheckConfig, runner: Arc<dyn CommandRunner>) -> CheckResult<Self> {
        let host = HostTool::new(config.tool.clone(), runner).with_timeout(config.timeout_seconds);
        let registry = config.registry(&host)?;

        Ok(Self::new(host, registry)
            .with_languages(config.languages.clone())
            .with_report_root(config.report_root.clone())
            .with_parallel(config.parallel_languages))
    }

    /// Languages to validate. Repeated names are validated once.
    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(languages.len());
        for language in languages {
            if !unique.contains(&language) {
                unique.push(language);
            }
        }
        self.languages = unique;
        self
    }

    pub fn with_report_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.report_root = root.into();
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn report_root(&self) -> &Path {
        &self.report_root
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// Run the whole check and write the report.
    ///
    /// The scratch directory lives until the report, which copies generated
    /// SDKs out of it, has been written.
    pub async fn run(&self, request: &CheckRequest, cancel: &Cancellation) -> CheckResult<CheckOutcome> {
        let scratch = tempfile::Builder::new().prefix(SCRATCH_PREFIX).tempdir()?;
        let report = self.assemble(request, scratch.path(), cancel).await?;

        let report_dir = ReportWriter::write(&report, &self.report_root)?;
        info!("Report written to {:?}", report_dir);

        Ok(CheckOutcome { report, report_dir })
    }

    /// Produce the report without writing it. Generated SDKs are left under
    /// `scratch_dir`.
    pub async fn assemble(
        &self,
        request: &CheckRequest,
        scratch_dir: &Path,
        cancel: &Cancellation,
    ) -> CheckResult<ProviderReport> {
        if request.source.trim().is_empty() {
            return Err(CheckError::Config("source must not be empty".to_string()));
        }
        let validators: Vec<LanguageValidator> = self
            .registry
            .select(&self.languages)?
            .into_iter()
            .map(|(language, toolchain)| LanguageValidator::new(language, toolchain))
            .collect();

        let versions = VersionResolver::new(self.host.clone()).resolve(cancel).await?;

        info!("Fetching schema for {}", request.source);
        let fetch = SchemaFetcher::new(self.host.clone())
            .fetch(&request.source, request.version.as_deref(), cancel)
            .await;

        let schema = match fetch.result {
            Ok(schema) => schema,
            Err(failure) => {
                return Ok(ProviderReport::schema_failed(
                    versions.provider,
                    versions.host_tool,
                    request.invocation_args(),
                    fetch.diagnostics,
                    failure,
                ));
            }
        };

        let schema_path = scratch_dir.join(STAGED_SCHEMA);
        let staged = stage_schema(&schema, &schema_path);
        let mut report = ProviderReport::fetched(
            versions.provider,
            versions.host_tool,
            request.invocation_args(),
            fetch.diagnostics,
            schema,
        );

        if let Err(e) = staged {
            warn!("Unable to stage schema at {:?}: {}", schema_path, e);
            for validator in &validators {
                report.record_language(
                    validator.language(),
                    LanguageReport::generation_failed(e.to_string().into_bytes()),
                )?;
            }
            return Ok(report);
        }

        let outcomes = if self.parallel {
            join_all(
                validators
                    .iter()
                    .map(|v| v.validate(&schema_path, scratch_dir, cancel)),
            )
            .await
        } else {
            let mut outcomes = Vec::with_capacity(validators.len());
            for validator in &validators {
                outcomes.push(validator.validate(&schema_path, scratch_dir, cancel).await);
            }
            outcomes
        };

        for (validator, outcome) in validators.iter().zip(outcomes) {
            report.record_language(validator.language(), outcome)?;
        }
        Ok(report)
    }
}

fn stage_schema(schema: &SchemaDocument, path: &Path) -> CheckResult<()> {
    let bytes = to_canonical_json(schema)?;
    fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use provcheck_report::SchemaFailureKind;
    use provcheck_runner::{MockResponse, MockRunner};
    use tempfile::tempdir;

    use crate::language::{Built, Generated, MockLanguageToolchain};

    const SCHEMA: &str = r#"{"name":"good-provider","version":"1.2.3"}"#;

    fn runner(fetch: MockResponse) -> MockRunner {
        MockRunner::new()
            .on(
                "pulumi",
                &["package", "get-schema", "terraform-provider", "good-provider"],
                fetch,
            )
            .on(
                "pulumi",
                &["package", "get-schema", "terraform-provider"],
                MockResponse::success(r#"{"name":"terraform-provider","version":"0.4.1"}"#),
            )
            .on("pulumi", &["version"], MockResponse::success("v3.130.0\n"))
    }

    fn pipeline(runner: MockRunner, registry: LanguageRegistry, languages: &[&str]) -> CheckPipeline {
        let host = HostTool::new("pulumi", Arc::new(runner));
        CheckPipeline::new(host, registry)
            .with_languages(languages.iter().map(|l| l.to_string()).collect())
    }

    fn succeeding(sdk_path: &Path) -> MockLanguageToolchain {
        let sdk_path = sdk_path.to_path_buf();
        let mut toolchain = MockLanguageToolchain::new();
        toolchain.expect_generate().returning(move |_, _, _| Generated {
            sdk_path: sdk_path.clone(),
            diagnostics: Vec::new(),
            error: None,
        });
        toolchain.expect_build().returning(|_, _| Built {
            command: "make".to_string(),
            diagnostics: Vec::new(),
            error: None,
        });
        toolchain
    }

    #[test]
    fn test_invocation_args() {
        assert_eq!(CheckRequest::new("hashicorp/random").invocation_args(), vec!["hashicorp/random"]);
        assert_eq!(
            CheckRequest::new("hashicorp/random").with_version("3.6.0").invocation_args(),
            vec!["hashicorp/random", "3.6.0"]
        );
        assert_eq!(
            CheckRequest::new("hashicorp/random").with_version("").invocation_args(),
            vec!["hashicorp/random"]
        );
    }

    #[test]
    fn test_repeated_languages_deduplicated() {
        let pipeline = pipeline(MockRunner::new(), LanguageRegistry::new(), &["go", "dotnet", "go"]);
        assert_eq!(pipeline.languages(), &["go".to_string(), "dotnet".to_string()]);
    }

    #[tokio::test]
    async fn test_schema_failure_skips_languages() {
        let scratch = tempdir().unwrap();
        let mut toolchain = MockLanguageToolchain::new();
        toolchain.expect_generate().never();
        toolchain.expect_build().never();
        let mut registry = LanguageRegistry::new();
        registry.register("dotnet", Arc::new(toolchain));

        let report = pipeline(runner(MockResponse::failure(1, "no such provider")), registry, &["dotnet"])
            .assemble(&CheckRequest::new("good-provider"), scratch.path(), &Cancellation::never())
            .await
            .unwrap();

        assert!(report.schema().is_none());
        assert_eq!(report.language_count(), 0);
        assert_eq!(report.schema_diagnostics, b"no such provider");
        assert_eq!(report.schema_failure().unwrap().kind, SchemaFailureKind::Invocation);
        assert_eq!(report.resolved_version, "0.4.1");
        assert_eq!(report.host_tool_version, "v3.130.0");
    }

    #[tokio::test]
    async fn test_languages_validated_against_staged_schema() {
        let scratch = tempdir().unwrap();
        let staged = scratch.path().join("schema.json");

        let mut failing = MockLanguageToolchain::new();
        let expected = staged.clone();
        failing
            .expect_generate()
            .withf(move |schema_path, _, _| schema_path == expected.as_path())
            .times(1)
            .returning(|_, _, _| Generated {
                sdk_path: PathBuf::from("/nowhere"),
                diagnostics: b"unsupported".to_vec(),
                error: Some("exit 1".to_string()),
            });
        failing.expect_build().never();

        let mut registry = LanguageRegistry::new();
        registry.register("dotnet", Arc::new(succeeding(&scratch.path().join("dotnet"))));
        registry.register("go", Arc::new(failing));

        let report = pipeline(runner(MockResponse::success(SCHEMA)), registry, &["dotnet", "go"])
            .assemble(&CheckRequest::new("good-provider"), scratch.path(), &Cancellation::never())
            .await
            .unwrap();

        assert_eq!(report.schema().unwrap().version(), "1.2.3");
        assert!(report.language("dotnet").unwrap().succeeded());
        assert!(!report.language("go").unwrap().generated());
        assert_eq!(report.language("go").unwrap().generation_diagnostics(), b"unsupported");

        let staged_text = fs::read_to_string(&staged).unwrap();
        assert!(staged_text.starts_with("{\n    \"name\": \"good-provider\""));
    }

    #[tokio::test]
    async fn test_sequential_matches_parallel() {
        for parallel in [true, false] {
            let scratch = tempdir().unwrap();
            let mut registry = LanguageRegistry::new();
            registry.register("dotnet", Arc::new(succeeding(Path::new("/a"))));
            registry.register("go", Arc::new(succeeding(Path::new("/b"))));

            let report = pipeline(runner(MockResponse::success(SCHEMA)), registry, &["go", "dotnet"])
                .with_parallel(parallel)
                .assemble(&CheckRequest::new("good-provider"), scratch.path(), &Cancellation::never())
                .await
                .unwrap();

            let names: Vec<&str> = report.languages().map(|(name, _)| name).collect();
            assert_eq!(names, vec!["dotnet", "go"]);
        }
    }

    #[tokio::test]
    async fn test_version_failure_is_fatal() {
        let scratch = tempdir().unwrap();
        let runner = MockRunner::new().on("pulumi", &["version"], MockResponse::failure(127, "not installed"));

        let err = pipeline(runner, LanguageRegistry::new(), &[])
            .assemble(&CheckRequest::new("good-provider"), scratch.path(), &Cancellation::never())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckError::Resolution { .. }));
    }

    #[tokio::test]
    async fn test_unknown_language_before_any_command() {
        let scratch = tempdir().unwrap();
        let runner = runner(MockResponse::success(SCHEMA));

        let err = pipeline(runner.clone(), LanguageRegistry::new(), &["cobol"])
            .assemble(&CheckRequest::new("good-provider"), scratch.path(), &Cancellation::never())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckError::UnknownLanguage(_)));
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_source_rejected() {
        let scratch = tempdir().unwrap();
        let err = pipeline(MockRunner::new(), LanguageRegistry::new(), &[])
            .assemble(&CheckRequest::new("  "), scratch.path(), &Cancellation::never())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckError::Config(_)));
    }
}
