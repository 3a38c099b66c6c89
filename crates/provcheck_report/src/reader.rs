//! Report reading.
//!
//! The inverse of [`crate::writer::ReportWriter`]: rebuilds a
//! [`ProviderReport`] from a report directory. Only `metadata.json` is
//! required; every other artifact may be absent.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{ReportError, ReportResult};
use crate::layout::{
    BUILD_STDERR_FILE, GEN_SDK_STDERR_FILE, METADATA_FILE, SCHEMA_FILE, SCHEMA_STDERR_FILE,
    SDK_DIR,
};
use crate::model::{
    LanguageMetadata, LanguageReport, ProviderReport, ReportMetadata, SchemaFailure,
    SchemaFailureKind,
};
use crate::schema::SchemaDocument;

/// Reader for report trees.
pub struct ReportReader;

impl ReportReader {
    /// Read the report stored in `dir`.
    pub fn read(dir: &Path) -> ReportResult<ProviderReport> {
        debug!("Reading report from {:?}", dir);

        let metadata: ReportMetadata = read_json(&dir.join(METADATA_FILE))?
            .ok_or_else(|| ReportError::MissingMetadata(dir.to_path_buf()))?;
        let schema_diagnostics = read_optional(&dir.join(SCHEMA_STDERR_FILE))?.unwrap_or_default();

        let schema = match read_optional(&dir.join(SCHEMA_FILE))? {
            Some(bytes) => Some(SchemaDocument::from_slice(&bytes)?),
            None => None,
        };

        let Some(schema) = schema else {
            let failure = metadata.schema_failure.unwrap_or_else(|| {
                SchemaFailure::new(SchemaFailureKind::Invocation, "no schema recorded")
            });
            return Ok(ProviderReport::schema_failed(
                metadata.resolved_version,
                metadata.host_tool_version,
                metadata.invocation_args,
                schema_diagnostics,
                failure,
            ));
        };

        let mut report = ProviderReport::fetched(
            metadata.resolved_version,
            metadata.host_tool_version,
            metadata.invocation_args,
            schema_diagnostics,
            schema,
        );

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_dir() {
                continue;
            }
            let language = entry.file_name().to_string_lossy().into_owned();
            match Self::read_language(entry.path())? {
                Some(language_report) => report.record_language(language, language_report)?,
                None => debug!("Skipping {:?}: no language metadata", entry.path()),
            }
        }

        Ok(report)
    }

    /// Read one language directory; `None` if it holds no metadata.
    pub fn read_language(dir: &Path) -> ReportResult<Option<LanguageReport>> {
        let Some(metadata) = read_json::<LanguageMetadata>(&dir.join(METADATA_FILE))? else {
            return Ok(None);
        };

        let sdk_dir = dir.join(SDK_DIR);
        let sdk_path = sdk_dir.is_dir().then_some(sdk_dir);
        if metadata.succeeded && sdk_path.is_none() {
            warn!("{:?} records a successful build but has no sdk/ copy", dir);
        }

        Ok(Some(LanguageReport::from_parts(
            read_optional(&dir.join(GEN_SDK_STDERR_FILE))?.unwrap_or_default(),
            sdk_path,
            metadata.build_command,
            read_optional(&dir.join(BUILD_STDERR_FILE))?.unwrap_or_default(),
            metadata.succeeded,
        )))
    }
}

fn read_optional(path: &Path) -> ReportResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ReportError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> ReportResult<Option<T>> {
    match read_optional(path)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_metadata() {
        let dir = tempdir().unwrap();
        let err = ReportReader::read(dir.path()).unwrap_err();
        assert!(matches!(err, ReportError::MissingMetadata(_)));
    }

    #[test]
    fn test_minimal_failure_report() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(METADATA_FILE),
            r#"{"invocationArgs":["fails-to-resolve"],"hostToolVersion":"v3.100.0"}"#,
        )
        .unwrap();

        let report = ReportReader::read(dir.path()).unwrap();
        assert!(report.schema().is_none());
        assert_eq!(report.invocation_args, vec!["fails-to-resolve"]);
        assert_eq!(report.host_tool_version, "v3.100.0");
        assert!(report.schema_diagnostics.is_empty());
        assert_eq!(report.language_count(), 0);
    }

    #[test]
    fn test_language_without_sdk_is_not_successful() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(METADATA_FILE),
            r#"{"buildCommand":"dotnet build","succeded":true}"#,
        )
        .unwrap();

        let report = ReportReader::read_language(dir.path()).unwrap().unwrap();
        assert!(!report.succeeded());
        assert!(!report.generated());
        assert_eq!(report.build_command(), "dotnet build");
    }

    #[test]
    fn test_directory_without_metadata_is_skipped() {
        let dir = tempdir().unwrap();
        assert!(ReportReader::read_language(dir.path()).unwrap().is_none());
    }
}
