//! Converter - Main API for converting files and directories
//!
//! This module provides the builder pattern API for configuring and
//! running a conversion over a set of paths, either writing annotated
//! sources back in place or only reporting what would change.

use crate::config::ConvertConfig;
use crate::diagnostics::{Diagnostic, DiagnosticsCollector, FlowdocError, FlowdocResult};
use crate::parser::{convert_file, Conversion};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Outcome for a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// No annotation was added
    Unchanged,
    /// Annotations were produced but not written
    Changed,
    /// Annotations were written back to disk
    Written,
    /// The file could not be read or parsed
    Failed,
}

impl FileStatus {
    /// Short label used in reports
    pub fn display(&self) -> &'static str {
        match self {
            FileStatus::Unchanged => "unchanged",
            FileStatus::Changed => "would change",
            FileStatus::Written => "written",
            FileStatus::Failed => "failed",
        }
    }
}

/// Per-file result of a conversion run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    /// Number of edits applied
    pub edits: usize,
    pub functions: usize,
    pub annotated_functions: usize,
    /// Converted source, kept for printing
    #[serde(skip)]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    fn from_conversion(conversion: Conversion, status: FileStatus) -> Self {
        Self {
            path: conversion.path,
            status,
            edits: conversion.edits.len(),
            functions: conversion.functions,
            annotated_functions: conversion.annotated_functions,
            output: Some(conversion.output),
            error: None,
        }
    }

    fn failed(path: PathBuf, error: &FlowdocError) -> Self {
        Self {
            path,
            status: FileStatus::Failed,
            edits: 0,
            functions: 0,
            annotated_functions: 0,
            output: None,
            error: Some(error.to_string()),
        }
    }

    /// Whether the file gained annotations
    pub fn is_changed(&self) -> bool {
        matches!(self.status, FileStatus::Changed | FileStatus::Written)
    }
}

/// Summary of a conversion run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertOutput {
    pub files: Vec<FileReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ConvertOutput {
    /// Number of files that gained annotations
    pub fn changed_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_changed()).count()
    }

    /// Number of files that failed
    pub fn failed_count(&self) -> usize {
        self.count(FileStatus::Failed)
    }

    /// Number of files written back
    pub fn written_count(&self) -> usize {
        self.count(FileStatus::Written)
    }

    /// Total edits across all files
    pub fn edit_count(&self) -> usize {
        self.files.iter().map(|f| f.edits).sum()
    }

    fn count(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }

    /// Whether any file gained annotations
    pub fn has_changes(&self) -> bool {
        self.changed_count() > 0
    }

    /// Whether any file failed
    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }

    /// Serialize the summary as pretty JSON
    pub fn to_json(&self) -> FlowdocResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for configuring a conversion run
///
/// # Example
///
/// ```no_run
/// use flowdoc::Converter;
///
/// let output = Converter::new()
///     .path("src")
///     .write(true)
///     .run()
///     .expect("Failed to convert sources");
/// println!("{} files changed", output.changed_count());
/// ```
#[derive(Debug, Default)]
pub struct Converter {
    /// Files or directories to convert
    pub paths: Vec<PathBuf>,
    /// Conversion settings
    pub config: ConvertConfig,
    /// Whether to write annotated sources back in place
    pub write: bool,
}

impl Converter {
    /// Create a new converter with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file or directory
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.push(path.into());
        self
    }

    /// Add several files or directories
    pub fn paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Set the conversion settings
    pub fn config(mut self, config: ConvertConfig) -> Self {
        self.config = config;
        self
    }

    /// Write annotated sources back in place (ignored in check mode)
    pub fn write(mut self, enable: bool) -> Self {
        self.write = enable;
        self
    }

    /// Expand the configured paths into the list of files to convert
    ///
    /// Files named explicitly are always kept. Directories are walked,
    /// keeping files with a configured extension and skipping configured
    /// directory names below the root.
    pub fn collect_files(&self) -> FlowdocResult<Vec<PathBuf>> {
        let mut files = Vec::new();

        for root in &self.paths {
            if !root.exists() {
                return Err(FlowdocError::FileNotFound(root.clone()));
            }
            if root.is_file() {
                files.push(root.clone());
                continue;
            }

            let walker = WalkDir::new(root)
                .follow_links(true)
                .into_iter()
                .filter_entry(|e| {
                    e.depth() == 0 || !e.file_type().is_dir() || !self.config.skips_dir(e.path())
                });
            for entry in walker {
                let entry = entry.map_err(|e| FlowdocError::other(e.to_string()))?;
                let path = entry.path();
                if entry.file_type().is_file() && self.config.accepts(path) {
                    files.push(path.to_path_buf());
                }
            }
        }

        files.sort();
        files.dedup();
        Ok(files)
    }

    /// Run the conversion
    ///
    /// Files that fail to read or parse are reported and skipped; the run
    /// itself only fails when a configured path is missing or a converted
    /// file cannot be written.
    pub fn run(self) -> FlowdocResult<ConvertOutput> {
        let files = self.collect_files()?;
        let write = self.write && !self.config.check;
        let mut diagnostics = DiagnosticsCollector::new();
        let mut reports = Vec::with_capacity(files.len());

        for path in files {
            match convert_file(&path, &self.config) {
                Ok(conversion) => {
                    let status = if !conversion.changed() {
                        FileStatus::Unchanged
                    } else if write {
                        write_output(&path, &conversion.output)?;
                        FileStatus::Written
                    } else {
                        FileStatus::Changed
                    };
                    tracing::info!(
                        path = %path.display(),
                        edits = conversion.edits.len(),
                        status = status.display(),
                        "converted"
                    );
                    reports.push(FileReport::from_conversion(conversion, status));
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping file");
                    diagnostics.add(Diagnostic::warning(e.to_string()).in_file(&path));
                    reports.push(FileReport::failed(path, &e));
                }
            }
        }

        Ok(ConvertOutput {
            files: reports,
            diagnostics: diagnostics.into_diagnostics(),
        })
    }
}

fn write_output(path: &Path, output: &str) -> FlowdocResult<()> {
    std::fs::write(path, output).map_err(|e| {
        FlowdocError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to write {}: {}", path.display(), e),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = "/** @param {number} a */\nfunction test(a) {}\n";

    fn write_file(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_collect_files_filters_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.js", SOURCE);
        let b = write_file(dir.path(), "lib/b.mjs", SOURCE);
        write_file(dir.path(), "lib/c.ts", SOURCE);
        write_file(dir.path(), "node_modules/d.js", SOURCE);

        let files = Converter::new().path(dir.path()).collect_files().unwrap();
        assert_eq!(files, vec![a, b]);
    }

    #[test]
    fn test_explicit_file_kept_and_deduped() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.ts", SOURCE);

        let files = Converter::new()
            .paths([&a, &a])
            .collect_files()
            .unwrap();
        assert_eq!(files, vec![a]);
    }

    #[test]
    fn test_missing_path() {
        let err = Converter::new()
            .path("/tmp/flowdoc-missing-dir")
            .run()
            .unwrap_err();
        assert!(matches!(err, FlowdocError::FileNotFound(_)));
    }

    #[test]
    fn test_run_without_write() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.js", SOURCE);
        write_file(dir.path(), "b.js", "function plain(x) {}\n");

        let output = Converter::new().path(dir.path()).run().unwrap();
        assert_eq!(output.files.len(), 2);
        assert_eq!(output.files[0].status, FileStatus::Changed);
        assert_eq!(output.files[1].status, FileStatus::Unchanged);
        assert_eq!(output.changed_count(), 1);
        assert_eq!(output.edit_count(), 1);
        assert_eq!(std::fs::read_to_string(a).unwrap(), SOURCE);
    }

    #[test]
    fn test_run_writes_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.js", SOURCE);

        let output = Converter::new().path(&a).write(true).run().unwrap();
        assert_eq!(output.written_count(), 1);
        assert_eq!(
            std::fs::read_to_string(&a).unwrap(),
            "/** @param {number} a */\nfunction test(a: number) {}\n"
        );

        // A second run finds nothing left to annotate
        let again = Converter::new().path(&a).write(true).run().unwrap();
        assert!(!again.has_changes());
    }

    #[test]
    fn test_check_mode_never_writes() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.js", SOURCE);

        let output = Converter::new()
            .path(&a)
            .config(ConvertConfig::default().with_check(true))
            .write(true)
            .run()
            .unwrap();
        assert_eq!(output.files[0].status, FileStatus::Changed);
        assert_eq!(std::fs::read_to_string(a).unwrap(), SOURCE);
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "bad.js", "function (");
        write_file(dir.path(), "good.js", SOURCE);

        let output = Converter::new().path(dir.path()).run().unwrap();
        assert!(output.has_failures());
        assert_eq!(output.failed_count(), 1);
        assert_eq!(output.diagnostics.len(), 1);
        assert!(output.files[0].error.is_some());
        assert_eq!(output.files[1].status, FileStatus::Changed);
    }

    #[test]
    fn test_to_json() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a.js", SOURCE);

        let output = Converter::new().path(dir.path()).run().unwrap();
        let json: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();
        assert_eq!(json["files"][0]["status"], "changed");
        assert_eq!(json["files"][0]["annotatedFunctions"], 1);
        assert!(json["files"][0].get("output").is_none());
        assert!(json.get("diagnostics").is_none());
    }
}
