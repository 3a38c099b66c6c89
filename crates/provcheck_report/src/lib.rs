//! # provcheck_report
//!
//! Validation report model and on-disk layout for provcheck.
//!
//! A [`ProviderReport`] records one validation run: the resolved versions,
//! the schema (or why there is none) and one [`LanguageReport`] per target
//! language. Reports are persisted as a directory tree:
//!
//! ```text
//! <root>/<hostToolVersion>/<source>/<schemaVersion>/
//!   schema.json
//!   schema-stderr.txt          (if non-empty)
//!   metadata.json
//!   <language>/
//!     gen-sdk-stderr.txt       (if non-empty)
//!     build-stderr.txt         (if non-empty)
//!     sdk/...                  (if generated)
//!     metadata.json
//! <root>/<hostToolVersion>/failures/<args-joined-by-dash>/
//!   metadata.json
//!   schema-stderr.txt          (if non-empty)
//! ```
//!
//! A language `metadata.json` holds `buildCommand` and `succeeded`. Readers
//! also accept the key spelled `succeded`, which some consumers of earlier
//! reports use; writers only ever emit `succeeded`.
//!
//! A source identifier that sanitizes to `failures` is stored as
//! `_failures` so it cannot share a directory with the failure bucket.
//! Rewriting a report removes artifacts and language directories the new
//! report does not carry.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use provcheck_report::{
//!     ProviderReport, ReportReader, ReportWriter, SchemaFailure, SchemaFailureKind,
//! };
//!
//! let report = ProviderReport::schema_failed(
//!     "0.1.0",
//!     "v3.100.0",
//!     vec!["fails-to-resolve".to_string()],
//!     b"no such provider".to_vec(),
//!     SchemaFailure::new(SchemaFailureKind::Invocation, "exit status 1"),
//! );
//!
//! let dir = ReportWriter::write(&report, Path::new("providers")).unwrap();
//! let back = ReportReader::read(&dir).unwrap();
//! assert_eq!(back, report);
//! ```

pub mod encode;
pub mod error;
pub mod layout;
pub mod model;
pub mod reader;
pub mod schema;
pub mod writer;

pub use encode::to_canonical_json;
pub use error::{ReportError, ReportResult};
pub use layout::{report_path, sanitize_segment};
pub use model::{
    LanguageMetadata, LanguageReport, ProviderReport, ReportMetadata, SchemaFailure,
    SchemaFailureKind, SchemaOutcome,
};
pub use reader::ReportReader;
pub use schema::SchemaDocument;
pub use writer::{ReportWriter, WriteOp};
