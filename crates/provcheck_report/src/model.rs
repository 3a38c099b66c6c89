//! Report data model.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, ReportResult};
use crate::schema::SchemaDocument;

/// Why the schema stage produced no schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaFailureKind {
    /// The schema subprocess failed or could not be started
    Invocation,
    /// The subprocess succeeded but its stdout was not a schema
    Parse,
    /// The run was cancelled while the schema was being fetched
    Cancelled,
}

impl std::fmt::Display for SchemaFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invocation => write!(f, "invocation"),
            Self::Parse => write!(f, "parse"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Recorded schema-stage failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFailure {
    pub kind: SchemaFailureKind,
    pub message: String,
}

impl SchemaFailure {
    pub fn new(kind: SchemaFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of the schema stage.
///
/// Language reports only exist alongside a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaOutcome {
    Fetched {
        schema: SchemaDocument,
        languages: BTreeMap<String, LanguageReport>,
    },
    Failed(SchemaFailure),
}

/// Result of one validation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReport {
    /// Version of the dynamically-bridged provider
    pub resolved_version: String,
    /// Version of the host tool driving the run
    pub host_tool_version: String,
    /// Arguments given to the schema fetch (source first)
    pub invocation_args: Vec<String>,
    /// Stderr of the schema fetch, kept even on success
    pub schema_diagnostics: Vec<u8>,
    outcome: SchemaOutcome,
}

impl ProviderReport {
    /// A report for a run whose schema stage failed.
    pub fn schema_failed(
        resolved_version: impl Into<String>,
        host_tool_version: impl Into<String>,
        invocation_args: Vec<String>,
        schema_diagnostics: Vec<u8>,
        failure: SchemaFailure,
    ) -> Self {
        Self {
            resolved_version: resolved_version.into(),
            host_tool_version: host_tool_version.into(),
            invocation_args,
            schema_diagnostics,
            outcome: SchemaOutcome::Failed(failure),
        }
    }

    /// A report for a run that obtained a schema. Languages are recorded
    /// afterwards with [`ProviderReport::record_language`].
    pub fn fetched(
        resolved_version: impl Into<String>,
        host_tool_version: impl Into<String>,
        invocation_args: Vec<String>,
        schema_diagnostics: Vec<u8>,
        schema: SchemaDocument,
    ) -> Self {
        Self {
            resolved_version: resolved_version.into(),
            host_tool_version: host_tool_version.into(),
            invocation_args,
            schema_diagnostics,
            outcome: SchemaOutcome::Fetched {
                schema,
                languages: BTreeMap::new(),
            },
        }
    }

    /// Record one language's outcome, replacing any earlier entry.
    pub fn record_language(
        &mut self,
        language: impl Into<String>,
        report: LanguageReport,
    ) -> ReportResult<()> {
        let language = language.into();
        match &mut self.outcome {
            SchemaOutcome::Fetched { languages, .. } => {
                languages.insert(language, report);
                Ok(())
            }
            SchemaOutcome::Failed(_) => Err(ReportError::LanguageWithoutSchema(language)),
        }
    }

    /// The source identifier the run was invoked for.
    pub fn source(&self) -> &str {
        self.invocation_args.first().map(String::as_str).unwrap_or_default()
    }

    pub fn outcome(&self) -> &SchemaOutcome {
        &self.outcome
    }

    pub fn schema(&self) -> Option<&SchemaDocument> {
        match &self.outcome {
            SchemaOutcome::Fetched { schema, .. } => Some(schema),
            SchemaOutcome::Failed(_) => None,
        }
    }

    pub fn schema_failure(&self) -> Option<&SchemaFailure> {
        match &self.outcome {
            SchemaOutcome::Fetched { .. } => None,
            SchemaOutcome::Failed(failure) => Some(failure),
        }
    }

    /// Language reports in name order. Empty when there is no schema.
    pub fn languages(&self) -> impl Iterator<Item = (&str, &LanguageReport)> {
        let languages = match &self.outcome {
            SchemaOutcome::Fetched { languages, .. } => Some(languages),
            SchemaOutcome::Failed(_) => None,
        };
        languages
            .into_iter()
            .flatten()
            .map(|(name, report)| (name.as_str(), report))
    }

    pub fn language(&self, name: &str) -> Option<&LanguageReport> {
        self.languages()
            .find(|(language, _)| *language == name)
            .map(|(_, report)| report)
    }

    pub fn language_count(&self) -> usize {
        self.languages().count()
    }

    /// The top-level `metadata.json` contents.
    pub fn metadata(&self) -> ReportMetadata {
        ReportMetadata {
            invocation_args: self.invocation_args.clone(),
            host_tool_version: self.host_tool_version.clone(),
            resolved_version: self.resolved_version.clone(),
            schema_failure: self.schema_failure().cloned(),
        }
    }
}

/// Per-language validation outcome.
///
/// Constructed only through [`LanguageReport::generation_failed`] and
/// [`LanguageReport::build_attempted`], so a successful report always has a
/// generated SDK and a build command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageReport {
    generation_diagnostics: Vec<u8>,
    generated_sdk_path: Option<PathBuf>,
    build_command: String,
    build_diagnostics: Vec<u8>,
    succeeded: bool,
}

impl LanguageReport {
    /// SDK generation failed; the build never ran.
    pub fn generation_failed(generation_diagnostics: Vec<u8>) -> Self {
        Self {
            generation_diagnostics,
            generated_sdk_path: None,
            build_command: String::new(),
            build_diagnostics: Vec::new(),
            succeeded: false,
        }
    }

    /// SDK generation succeeded and the build was run.
    pub fn build_attempted(
        generated_sdk_path: impl Into<PathBuf>,
        generation_diagnostics: Vec<u8>,
        build_command: impl Into<String>,
        build_diagnostics: Vec<u8>,
        build_succeeded: bool,
    ) -> Self {
        let build_command = build_command.into();
        Self {
            generation_diagnostics,
            generated_sdk_path: Some(generated_sdk_path.into()),
            succeeded: build_succeeded && !build_command.is_empty(),
            build_command,
            build_diagnostics,
        }
    }

    /// Reassemble a report read back from disk.
    pub(crate) fn from_parts(
        generation_diagnostics: Vec<u8>,
        generated_sdk_path: Option<PathBuf>,
        build_command: String,
        build_diagnostics: Vec<u8>,
        succeeded: bool,
    ) -> Self {
        Self {
            succeeded: succeeded && generated_sdk_path.is_some() && !build_command.is_empty(),
            generation_diagnostics,
            generated_sdk_path,
            build_command,
            build_diagnostics,
        }
    }

    pub fn generation_diagnostics(&self) -> &[u8] {
        &self.generation_diagnostics
    }

    pub fn generated_sdk_path(&self) -> Option<&Path> {
        self.generated_sdk_path.as_deref()
    }

    pub fn build_command(&self) -> &str {
        &self.build_command
    }

    pub fn build_diagnostics(&self) -> &[u8] {
        &self.build_diagnostics
    }

    /// Whether SDK generation produced a tree.
    pub fn generated(&self) -> bool {
        self.generated_sdk_path.is_some()
    }

    /// Whether both generation and build completed without error.
    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// The language `metadata.json` contents.
    pub fn metadata(&self) -> LanguageMetadata {
        LanguageMetadata {
            build_command: self.build_command.clone(),
            succeeded: self.succeeded,
        }
    }
}

/// Top-level `metadata.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub invocation_args: Vec<String>,
    pub host_tool_version: String,
    #[serde(default)]
    pub resolved_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_failure: Option<SchemaFailure>,
}

/// Per-language `metadata.json`.
///
/// Written with `succeeded`; `succeded` is accepted on read for reports
/// produced by tools that used that spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageMetadata {
    pub build_command: String,
    #[serde(alias = "succeded")]
    pub succeeded: bool,
}
