//! Error types and diagnostics
//!
//! This module provides error handling and diagnostic reporting
//! for source conversion.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for flowdoc operations
pub type FlowdocResult<T> = Result<T, FlowdocError>;

/// Main error type for flowdoc
///
/// The annotation engine itself never fails: malformed tags degrade to
/// fewer or untyped annotations. Errors only come from the layers around
/// it (reading files, parsing source, loading configuration).
#[derive(Debug, Error)]
pub enum FlowdocError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error in {file}: {message}")]
    Parse {
        file: PathBuf,
        message: String,
        line: Option<usize>,
        col: Option<usize>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file could not be deserialized
    #[error("Invalid configuration file: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl FlowdocError {
    /// Create a parse error with location
    pub fn parse_at(
        file: impl Into<PathBuf>,
        message: impl Into<String>,
        line: usize,
        col: usize,
    ) -> Self {
        FlowdocError::Parse {
            file: file.into(),
            message: message.into(),
            line: Some(line),
            col: Some(col),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        FlowdocError::Config(message.into())
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        FlowdocError::Other(message.into())
    }
}

/// A per-file warning collected during a conversion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub message: String,
    /// Source file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a warning diagnostic
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: None,
        }
    }

    /// Set the source file
    pub fn in_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// Collector for diagnostics during a conversion run
#[derive(Debug, Default)]
pub struct DiagnosticsCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticsCollector {
    /// Create a new collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Take the collected diagnostics
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
