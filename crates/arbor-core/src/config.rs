//! Scan configuration.

use std::path::PathBuf;

use derive_builder::Builder;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Total progress range reported over a whole scan.
pub const DEFAULT_PROGRESS_RANGE: u64 = 1_000_000;

/// Options for a filesystem scan.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanOptions {
    /// Root directory to scan.
    pub root: PathBuf,

    /// Patterns to skip (glob syntax), matched against entry file names.
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Upper bound of the progress scale; progress runs from 0 to this.
    #[builder(default = "DEFAULT_PROGRESS_RANGE")]
    #[serde(default = "default_progress_range")]
    pub progress_range: u64,
}

fn default_progress_range() -> u64 {
    DEFAULT_PROGRESS_RANGE
}

impl ScanOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if let Some(range) = self.progress_range {
            if range == 0 {
                return Err("Progress range must be positive".to_string());
            }
        }
        Ok(())
    }
}

impl ScanOptions {
    /// Create a new scan options builder.
    pub fn builder() -> ScanOptionsBuilder {
        ScanOptionsBuilder::default()
    }

    /// Simple options for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore_patterns: Vec::new(),
            progress_range: DEFAULT_PROGRESS_RANGE,
        }
    }

    /// Compile the ignore patterns into a matcher.
    pub fn build_ignore_set(&self) -> Result<GlobSet, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.ignore_patterns {
            let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidConfig {
                message: format!("Bad ignore pattern {pattern:?}: {e}"),
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|e| ScanError::InvalidConfig {
            message: format!("Failed to compile ignore patterns: {e}"),
        })
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::new(".")
    }
}
