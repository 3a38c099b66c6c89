//! Integration tests for writing and reading report trees.

use std::fs;
use std::path::Path;

use provcheck_report::{
    LanguageReport, ProviderReport, ReportReader, ReportWriter, SchemaDocument, SchemaFailure,
    SchemaFailureKind,
};
use tempfile::tempdir;

fn good_schema() -> SchemaDocument {
    SchemaDocument::from_slice(br#"{"name":"good-provider","version":"1.2.3"}"#).unwrap()
}

fn fetched_report() -> ProviderReport {
    ProviderReport::fetched(
        "0.1.0",
        "v3.100.0",
        vec!["good-provider".to_string()],
        b"warning: deprecated".to_vec(),
        good_schema(),
    )
}

fn generated_sdk(root: &Path, language: &str) -> std::path::PathBuf {
    let sdk = root.join(language);
    fs::create_dir_all(sdk.join("src")).unwrap();
    fs::write(sdk.join("README.md"), "# sdk").unwrap();
    fs::write(sdk.join("src").join("Provider.cs"), "class Provider {}").unwrap();
    sdk
}

/// A failed schema fetch lands under failures/ with its stderr and no schema.
#[test]
fn test_schema_failure_tree() {
    let root = tempdir().unwrap();
    let report = ProviderReport::schema_failed(
        "0.1.0",
        "v3.100.0",
        vec!["fails-to-resolve".to_string()],
        b"no such provider".to_vec(),
        SchemaFailure::new(SchemaFailureKind::Invocation, "exited with code 1"),
    );

    let dir = ReportWriter::write(&report, root.path()).unwrap();

    assert_eq!(dir, root.path().join("v3.100.0/failures/fails-to-resolve"));
    assert_eq!(
        fs::read_to_string(dir.join("schema-stderr.txt")).unwrap(),
        "no such provider"
    );
    assert!(!dir.join("schema.json").exists());

    let metadata: serde_json::Value =
        serde_json::from_slice(&fs::read(dir.join("metadata.json")).unwrap()).unwrap();
    assert_eq!(metadata["invocationArgs"], serde_json::json!(["fails-to-resolve"]));
    assert_eq!(metadata["hostToolVersion"], "v3.100.0");
    assert_eq!(metadata["schemaFailure"]["kind"], "invocation");

    assert_eq!(ReportReader::read(&dir).unwrap(), report);
}

/// Generation succeeds, build fails: stderr, metadata and sdk copy are written.
#[test]
fn test_build_failure_tree() {
    let root = tempdir().unwrap();
    let scratch = tempdir().unwrap();
    let sdk = generated_sdk(scratch.path(), "dotnet");

    let mut report = fetched_report();
    report
        .record_language(
            "dotnet",
            LanguageReport::build_attempted(&sdk, Vec::new(), "dotnet build", b"CS0001".to_vec(), false),
        )
        .unwrap();

    let dir = ReportWriter::write(&report, root.path()).unwrap();
    let language_dir = dir.join("dotnet");

    assert_eq!(dir, root.path().join("v3.100.0/good-provider/1.2.3"));
    assert!(!language_dir.join("gen-sdk-stderr.txt").exists());
    assert_eq!(
        fs::read_to_string(language_dir.join("build-stderr.txt")).unwrap(),
        "CS0001"
    );
    assert_eq!(
        fs::read_to_string(language_dir.join("metadata.json")).unwrap(),
        "{\n    \"buildCommand\": \"dotnet build\",\n    \"succeeded\": false\n}\n"
    );
    assert_eq!(
        fs::read_to_string(language_dir.join("sdk/src/Provider.cs")).unwrap(),
        "class Provider {}"
    );
    assert!(language_dir.join("sdk/README.md").exists());
}

/// One language succeeds, one fails generation: both recorded, only one sdk/.
#[test]
fn test_mixed_languages_tree() {
    let root = tempdir().unwrap();
    let scratch = tempdir().unwrap();
    let sdk = generated_sdk(scratch.path(), "go");

    let mut report = fetched_report();
    report
        .record_language(
            "go",
            LanguageReport::build_attempted(&sdk, Vec::new(), "go build ./...", Vec::new(), true),
        )
        .unwrap();
    report
        .record_language(
            "nodejs",
            LanguageReport::generation_failed(b"error: unsupported".to_vec()),
        )
        .unwrap();

    let dir = ReportWriter::write(&report, root.path()).unwrap();

    assert!(dir.join("go/sdk/README.md").exists());
    assert!(!dir.join("go/build-stderr.txt").exists());
    assert!(!dir.join("nodejs/sdk").exists());
    assert_eq!(
        fs::read_to_string(dir.join("nodejs/gen-sdk-stderr.txt")).unwrap(),
        "error: unsupported"
    );

    let back = ReportReader::read(&dir).unwrap();
    assert_eq!(back.language_count(), 2);
    assert!(back.language("go").unwrap().succeeded());
    assert_eq!(
        back.language("go").unwrap().generated_sdk_path(),
        Some(dir.join("go/sdk").as_path())
    );
    let nodejs = back.language("nodejs").unwrap();
    assert!(!nodejs.succeeded());
    assert!(!nodejs.generated());
    assert!(nodejs.build_diagnostics().is_empty());
    assert_eq!(
        back.schema_diagnostics,
        b"warning: deprecated".to_vec()
    );
}

/// Writing the same report twice produces identical files.
#[test]
fn test_rewrite_is_idempotent() {
    let root = tempdir().unwrap();
    let scratch = tempdir().unwrap();
    let sdk = generated_sdk(scratch.path(), "dotnet");

    let mut report = fetched_report();
    report
        .record_language(
            "dotnet",
            LanguageReport::build_attempted(&sdk, Vec::new(), "dotnet build", Vec::new(), true),
        )
        .unwrap();

    let dir = ReportWriter::write(&report, root.path()).unwrap();
    let schema_first = fs::read(dir.join("schema.json")).unwrap();
    let metadata_first = fs::read(dir.join("metadata.json")).unwrap();
    let language_first = fs::read(dir.join("dotnet/metadata.json")).unwrap();

    ReportWriter::write(&report, root.path()).unwrap();

    assert_eq!(fs::read(dir.join("schema.json")).unwrap(), schema_first);
    assert_eq!(fs::read(dir.join("metadata.json")).unwrap(), metadata_first);
    assert_eq!(fs::read(dir.join("dotnet/metadata.json")).unwrap(), language_first);
    assert!(!dir.join("dotnet/sdk/dotnet").exists());
}

/// Artifacts from an earlier run at the same path are cleared.
#[test]
fn test_rewrite_removes_stale_artifacts() {
    let root = tempdir().unwrap();
    let scratch = tempdir().unwrap();
    let sdk = generated_sdk(scratch.path(), "dotnet");

    let mut first = fetched_report();
    first
        .record_language(
            "dotnet",
            LanguageReport::build_attempted(&sdk, Vec::new(), "dotnet build", b"CS0001".to_vec(), false),
        )
        .unwrap();
    let dir = ReportWriter::write(&first, root.path()).unwrap();
    assert!(dir.join("dotnet/build-stderr.txt").exists());

    let mut second = fetched_report();
    second
        .record_language("dotnet", LanguageReport::generation_failed(b"gen".to_vec()))
        .unwrap();
    ReportWriter::write(&second, root.path()).unwrap();

    assert!(!dir.join("dotnet/build-stderr.txt").exists());
    assert!(!dir.join("dotnet/sdk").exists());
    assert!(dir.join("dotnet/gen-sdk-stderr.txt").exists());
}

/// The schema document is written back with its original key order.
#[test]
fn test_rewrite_removes_dropped_languages() {
    let root = tempdir().unwrap();
    let scratch = tempdir().unwrap();
    let sdk = generated_sdk(scratch.path(), "dotnet");

    let mut first = fetched_report();
    first
        .record_language(
            "dotnet",
            LanguageReport::build_attempted(&sdk, Vec::new(), "dotnet build", Vec::new(), true),
        )
        .unwrap();
    let dir = ReportWriter::write(&first, root.path()).unwrap();
    assert!(dir.join("dotnet/metadata.json").exists());

    // Unrelated directories without metadata are left alone.
    fs::create_dir_all(dir.join("notes")).unwrap();

    let mut second = fetched_report();
    second
        .record_language("go", LanguageReport::generation_failed(Vec::new()))
        .unwrap();
    ReportWriter::write(&second, root.path()).unwrap();

    assert!(!dir.join("dotnet").exists());
    assert!(dir.join("go/metadata.json").exists());
    assert!(dir.join("notes").is_dir());

    let back = ReportReader::read(&dir).unwrap();
    let names: Vec<&str> = back.languages().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["go"]);
}

#[test]
fn test_schema_written_in_original_order() {
    let root = tempdir().unwrap();
    let schema = SchemaDocument::from_slice(
        br#"{"version":"1.2.3","name":"good-provider","resources":{"b":{},"a":{}}}"#,
    )
    .unwrap();
    let report = ProviderReport::fetched(
        "0.1.0",
        "v3.100.0",
        vec!["good-provider".to_string()],
        Vec::new(),
        schema,
    );

    let dir = ReportWriter::write(&report, root.path()).unwrap();
    let written = fs::read_to_string(dir.join("schema.json")).unwrap();

    let version = written.find("\"version\"").unwrap();
    let name = written.find("\"name\"").unwrap();
    let b = written.find("\"b\"").unwrap();
    let a = written.find("\"a\"").unwrap();
    assert!(version < name);
    assert!(b < a);
    assert!(written.starts_with("{\n    \"version\": \"1.2.3\""));
}

/// A filesystem error surfaces and leaves earlier writes in place.
#[test]
fn test_write_error_keeps_partial_output() {
    let root = tempdir().unwrap();
    let mut report = fetched_report();
    report
        .record_language(
            "dotnet",
            LanguageReport::build_attempted(
                root.path().join("does-not-exist"),
                Vec::new(),
                "dotnet build",
                Vec::new(),
                true,
            ),
        )
        .unwrap();

    let result = ReportWriter::write(&report, root.path());

    assert!(result.is_err());
    let dir = root.path().join("v3.100.0/good-provider/1.2.3");
    assert!(dir.join("schema.json").exists());
    assert!(dir.join("metadata.json").exists());
    assert!(!dir.join("dotnet/metadata.json").exists());
}
