//! On-disk report layout.
//!
//! ```text
//! <root>/<hostToolVersion>/<source>/<schemaVersion>/    schema obtained
//! <root>/<hostToolVersion>/failures/<args-joined-by-dash>/   no schema
//! ```

use std::path::PathBuf;

use crate::model::ProviderReport;

pub const SCHEMA_FILE: &str = "schema.json";
pub const SCHEMA_STDERR_FILE: &str = "schema-stderr.txt";
pub const METADATA_FILE: &str = "metadata.json";
pub const GEN_SDK_STDERR_FILE: &str = "gen-sdk-stderr.txt";
pub const BUILD_STDERR_FILE: &str = "build-stderr.txt";
pub const SDK_DIR: &str = "sdk";
pub const FAILURES_DIR: &str = "failures";

/// Make an externally supplied string usable as a single path segment.
///
/// Separators, whitespace and control characters become `-`; segments that
/// would be empty or refer to the current/parent directory become `_`.
pub fn sanitize_segment(raw: &str) -> String {
    let segment: String = raw
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c == ':' || c.is_whitespace() || c.is_control() {
                '-'
            } else {
                c
            }
        })
        .collect();

    match segment.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => segment,
    }
}

/// A source named like the failure bucket is moved aside so the two never
/// share a directory.
fn source_segment(source: &str) -> String {
    let segment = sanitize_segment(source);
    if segment == FAILURES_DIR {
        format!("_{}", segment)
    } else {
        segment
    }
}

/// Storage path of a report, relative to the report root.
pub fn report_path(report: &ProviderReport) -> PathBuf {
    let mut path = PathBuf::from(sanitize_segment(&report.host_tool_version));
    match report.schema() {
        Some(schema) => {
            path.push(source_segment(report.source()));
            path.push(sanitize_segment(schema.version()));
        }
        None => {
            path.push(FAILURES_DIR);
            path.push(sanitize_segment(&report.invocation_args.join("-")));
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SchemaFailure, SchemaFailureKind};
    use crate::schema::SchemaDocument;

    fn failed(args: &[&str]) -> ProviderReport {
        ProviderReport::schema_failed(
            "0.1.0",
            "v3.100.0",
            args.iter().map(|s| s.to_string()).collect(),
            Vec::new(),
            SchemaFailure::new(SchemaFailureKind::Invocation, "exit 1"),
        )
    }

    #[test]
    fn test_sanitize_segment() {
        assert_eq!(sanitize_segment("fails-to-resolve"), "fails-to-resolve");
        assert_eq!(sanitize_segment("1.2.3"), "1.2.3");
        assert_eq!(sanitize_segment("hashicorp/random"), "hashicorp-random");
        assert_eq!(sanitize_segment("a b\\c:d"), "a-b-c-d");
        assert_eq!(sanitize_segment(".."), "_");
        assert_eq!(sanitize_segment(""), "_");
    }

    #[test]
    fn test_failure_path_joins_args() {
        assert_eq!(
            report_path(&failed(&["fails-to-resolve"])),
            PathBuf::from("v3.100.0/failures/fails-to-resolve")
        );
        assert_eq!(
            report_path(&failed(&["hashicorp/random", "3.6.0"])),
            PathBuf::from("v3.100.0/failures/hashicorp-random-3.6.0")
        );
    }

    #[test]
    fn test_success_path_ignores_extra_args() {
        let schema =
            SchemaDocument::from_slice(br#"{"name":"good-provider","version":"1.2.3"}"#).unwrap();
        let plain = ProviderReport::fetched(
            "0.1.0",
            "v3.100.0",
            vec!["good-provider".to_string()],
            Vec::new(),
            schema.clone(),
        );
        let pinned = ProviderReport::fetched(
            "0.1.0",
            "v3.100.0",
            vec!["good-provider".to_string(), "1.2.3".to_string()],
            Vec::new(),
            schema,
        );

        let expected = PathBuf::from("v3.100.0/good-provider/1.2.3");
        assert_eq!(report_path(&plain), expected);
        assert_eq!(report_path(&pinned), expected);
    }

    #[test]
    fn test_source_cannot_land_in_failure_bucket() {
        let schema = SchemaDocument::from_slice(br#"{"name":"failures","version":"1.2.3"}"#).unwrap();
        let report = ProviderReport::fetched(
            "0.1.0",
            "v3.100.0",
            vec!["failures".to_string()],
            Vec::new(),
            schema,
        );

        assert_eq!(report_path(&report), PathBuf::from("v3.100.0/_failures/1.2.3"));
        assert_ne!(report_path(&report), report_path(&failed(&["1.2.3"])));
    }
}
