//! Conversion settings, loadable from `flowdoc.toml`

use crate::diagnostics::{FlowdocError, FlowdocResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in a directory
pub const CONFIG_FILE_NAME: &str = "flowdoc.toml";

/// Settings for a conversion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ConvertConfig {
    /// Annotate return types from `@returns`
    pub returns: bool,
    /// File extensions picked up when walking directories
    pub extensions: Vec<String>,
    /// Directory names never descended into
    pub skip_dirs: Vec<String>,
    /// Report files that would change instead of writing them
    pub check: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            returns: true,
            extensions: vec!["js".into(), "jsx".into(), "mjs".into(), "cjs".into()],
            skip_dirs: vec!["node_modules".into()],
            check: false,
        }
    }
}

impl ConvertConfig {
    /// Parse from TOML text
    pub fn from_toml_str(text: &str) -> FlowdocResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> FlowdocResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FlowdocError::FileNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text).map_err(|e| {
            FlowdocError::config(format!("{}: {}", path.display(), e))
        })
    }

    /// Find `flowdoc.toml` in `dir` or one of its ancestors
    pub fn discover(dir: impl AsRef<Path>) -> Option<PathBuf> {
        dir.as_ref()
            .ancestors()
            .map(|d| d.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Enable or disable return annotations
    pub fn with_returns(mut self, enabled: bool) -> Self {
        self.returns = enabled;
        self
    }

    /// Set check mode
    pub fn with_check(mut self, check: bool) -> Self {
        self.check = check;
        self
    }

    /// Replace the extension list
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Whether a file is picked up by extension
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext))
    }

    /// Whether a directory is skipped by name
    pub fn skips_dir(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.skip_dirs.iter().any(|skip| skip == name))
    }
}
