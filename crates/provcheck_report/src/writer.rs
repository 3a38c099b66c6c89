//! Report writing.
//!
//! Writing is split in two: [`ReportWriter::plan`] turns a report into an
//! ordered list of [`WriteOp`]s without touching the filesystem, and
//! [`ReportWriter::apply`] executes them. The first failing operation stops
//! the apply; operations that already ran stay on disk.

use std::fs;
use std::path::{Path, PathBuf};

use fs_extra::dir::CopyOptions;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::encode::to_canonical_json;
use crate::error::{ReportError, ReportResult};
use crate::layout::{
    report_path, sanitize_segment, BUILD_STDERR_FILE, GEN_SDK_STDERR_FILE, METADATA_FILE,
    SCHEMA_FILE, SCHEMA_STDERR_FILE, SDK_DIR,
};
use crate::model::{LanguageReport, ProviderReport};

/// A single filesystem step of a report write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Create a directory and its parents
    CreateDir(PathBuf),
    /// Create or truncate a file with these contents
    WriteFile { path: PathBuf, contents: Vec<u8> },
    /// Delete a stale file or directory tree, if present
    Remove(PathBuf),
    /// Copy the contents of `from` into `to`
    CopyTree { from: PathBuf, to: PathBuf },
    /// Delete language directories under `dir` not named in `keep`
    PruneLanguages { dir: PathBuf, keep: Vec<String> },
}

impl WriteOp {
    /// Path this operation writes to or removes.
    pub fn target(&self) -> &Path {
        match self {
            Self::CreateDir(path) | Self::Remove(path) => path.as_path(),
            Self::WriteFile { path, .. } => path.as_path(),
            Self::CopyTree { to, .. } => to.as_path(),
            Self::PruneLanguages { dir, .. } => dir.as_path(),
        }
    }
}

/// Writer for report trees.
pub struct ReportWriter;

impl ReportWriter {
    /// Compute every write needed to persist `report` under `root`.
    ///
    /// Optional artifacts the report does not carry are planned as removals
    /// so rewriting a path never leaves output from an earlier run behind.
    pub fn plan(report: &ProviderReport, root: &Path) -> ReportResult<Vec<WriteOp>> {
        let dir = root.join(report_path(report));
        let mut ops = vec![WriteOp::CreateDir(dir.clone())];

        match report.schema() {
            Some(schema) => ops.push(WriteOp::WriteFile {
                path: dir.join(SCHEMA_FILE),
                contents: to_canonical_json(schema)?,
            }),
            None => ops.push(WriteOp::Remove(dir.join(SCHEMA_FILE))),
        }

        ops.push(optional_file(
            dir.join(SCHEMA_STDERR_FILE),
            &report.schema_diagnostics,
        ));

        ops.push(WriteOp::WriteFile {
            path: dir.join(METADATA_FILE),
            contents: to_canonical_json(&report.metadata())?,
        });

        ops.push(WriteOp::PruneLanguages {
            dir: dir.clone(),
            keep: report
                .languages()
                .map(|(language, _)| sanitize_segment(language))
                .collect(),
        });

        for (language, language_report) in report.languages() {
            plan_language(&mut ops, &dir.join(sanitize_segment(language)), language_report)?;
        }

        Ok(ops)
    }

    /// Execute planned operations in order.
    pub fn apply(ops: &[WriteOp]) -> ReportResult<()> {
        for op in ops {
            apply_one(op)?;
        }
        Ok(())
    }

    /// Plan and apply; returns the report directory.
    pub fn write(report: &ProviderReport, root: &Path) -> ReportResult<PathBuf> {
        let dir = root.join(report_path(report));
        let ops = Self::plan(report, root)?;
        info!("Writing report to {:?} ({} operations)", dir, ops.len());
        Self::apply(&ops)?;
        Ok(dir)
    }
}

fn optional_file(path: PathBuf, contents: &[u8]) -> WriteOp {
    if contents.is_empty() {
        WriteOp::Remove(path)
    } else {
        WriteOp::WriteFile {
            path,
            contents: contents.to_vec(),
        }
    }
}

fn plan_language(ops: &mut Vec<WriteOp>, dir: &Path, report: &LanguageReport) -> ReportResult<()> {
    ops.push(WriteOp::CreateDir(dir.to_path_buf()));
    ops.push(optional_file(
        dir.join(BUILD_STDERR_FILE),
        report.build_diagnostics(),
    ));
    ops.push(optional_file(
        dir.join(GEN_SDK_STDERR_FILE),
        report.generation_diagnostics(),
    ));

    let sdk_dir = dir.join(SDK_DIR);
    ops.push(WriteOp::Remove(sdk_dir.clone()));
    if let Some(sdk_path) = report.generated_sdk_path() {
        ops.push(WriteOp::CopyTree {
            from: sdk_path.to_path_buf(),
            to: sdk_dir,
        });
    }

    ops.push(WriteOp::WriteFile {
        path: dir.join(METADATA_FILE),
        contents: to_canonical_json(&report.metadata())?,
    });
    Ok(())
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> ReportError + '_ {
    move |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    }
}

fn apply_one(op: &WriteOp) -> ReportResult<()> {
    debug!("Applying {:?}", op.target());
    match op {
        WriteOp::CreateDir(path) => fs::create_dir_all(path).map_err(write_error(path)),
        WriteOp::WriteFile { path, contents } => fs::write(path, contents).map_err(write_error(path)),
        WriteOp::Remove(path) => match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).map_err(write_error(path)),
            Ok(_) => fs::remove_file(path).map_err(write_error(path)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(write_error(path)(e)),
        },
        WriteOp::CopyTree { from, to } => {
            fs::create_dir_all(to).map_err(write_error(to))?;
            let mut options = CopyOptions::new();
            options.overwrite = true;
            options.content_only = true;
            fs_extra::dir::copy(from, to, &options)
                .map(|_| ())
                .map_err(|e| ReportError::Copy {
                    from: from.clone(),
                    to: to.clone(),
                    message: e.to_string(),
                })
        }
        WriteOp::PruneLanguages { dir, keep } => prune_languages(dir, keep),
    }
}

/// A language directory is any child directory holding a `metadata.json`.
fn prune_languages(dir: &Path, keep: &[String]) -> ReportResult<()> {
    let mut stale = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| ReportError::Read {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        if !entry.file_type().is_dir() || !entry.path().join(METADATA_FILE).is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !keep.iter().any(|k| *k == name) {
            stale.push(entry.into_path());
        }
    }

    for path in stale {
        debug!("Removing stale language directory {:?}", path);
        fs::remove_dir_all(&path).map_err(write_error(&path))?;
    }
    Ok(())
}
