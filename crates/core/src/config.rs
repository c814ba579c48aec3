use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_MIN_WIDTH: u32 = 100;
pub const DEFAULT_MIN_SIZE_KB: f64 = 10.0;
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpeg", "jpg"];

/// Thresholds and allow-list applied by the inspector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    pub min_width: u32,
    pub min_size_kb: f64,
    /// Lowercase extensions without the leading dot.
    pub allowed_extensions: Vec<String>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            min_width: DEFAULT_MIN_WIDTH,
            min_size_kb: DEFAULT_MIN_SIZE_KB,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

impl ValidationPolicy {
    /// Case-insensitive; tolerates a leading dot in configured entries.
    pub fn allows_extension(&self, ext: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Everything a pipeline run needs to know about its environment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source_dir: PathBuf,
    pub validated_dir: PathBuf,
    pub rejected_dir: PathBuf,
    pub store_path: PathBuf,
    pub policy: ValidationPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("source_data"),
            validated_dir: PathBuf::from("processed_data/validated"),
            rejected_dir: PathBuf::from("processed_data/bad"),
            store_path: PathBuf::from("image_metadata.db"),
            policy: ValidationPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Lay out source, outcome directories and store under a single root.
    pub fn rooted_at(root: &Path) -> Self {
        let defaults = Self::default();
        Self {
            source_dir: root.join(defaults.source_dir),
            validated_dir: root.join(defaults.validated_dir),
            rejected_dir: root.join(defaults.rejected_dir),
            store_path: root.join(defaults.store_path),
            policy: defaults.policy,
        }
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}
