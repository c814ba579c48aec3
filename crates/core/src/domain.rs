use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Final outcome of validating one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValidationStatus {
    Passed,
    Failed,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Passed => "PASSED",
            ValidationStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PASSED" => Ok(ValidationStatus::Passed),
            "FAILED" => Ok(ValidationStatus::Failed),
            other => Err(Error::InvalidStatus(other.to_string())),
        }
    }
}

/// Properties extracted from an image that passed every check.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    /// File size in KB, rounded to 2 decimals.
    pub size_kb: f64,
    /// Decoder format tag, e.g. `PNG` or `JPEG`.
    pub format: String,
}

/// Coarse category of a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    InputFormat,
    Integrity,
    Policy,
    Unexpected,
}

/// Why a file was rejected. Its `Display` text becomes the stored note.
#[derive(Debug, thiserror::Error)]
pub enum Rejection {
    #[error("invalid file format: {}", .0.display())]
    InvalidFormat(PathBuf),

    #[error("corrupt or unreadable image {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("{} is below minimum resolution ({width} px wide, minimum {min_width} px)", .path.display())]
    BelowMinWidth {
        path: PathBuf,
        width: u32,
        min_width: u32,
    },

    #[error("{} is too small ({size_bytes} bytes, minimum {min_size_kb} KB)", .path.display())]
    TooSmall {
        path: PathBuf,
        size_bytes: u64,
        min_size_kb: f64,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Rejection {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Rejection::InvalidFormat(_) => RejectionKind::InputFormat,
            Rejection::Corrupt { .. } => RejectionKind::Integrity,
            Rejection::BelowMinWidth { .. } | Rejection::TooSmall { .. } => RejectionKind::Policy,
            Rejection::Unreadable { .. } => RejectionKind::Unexpected,
        }
    }
}

pub const PASSED_NOTE: &str = "Validation successful";

/// Output of the inspector for a single file.
#[derive(Debug)]
pub enum Classification {
    Passed(ImageMetadata),
    Failed(Rejection),
}

impl Classification {
    pub fn status(&self) -> ValidationStatus {
        match self {
            Classification::Passed(_) => ValidationStatus::Passed,
            Classification::Failed(_) => ValidationStatus::Failed,
        }
    }

    pub fn notes(&self) -> String {
        match self {
            Classification::Passed(_) => PASSED_NOTE.to_string(),
            Classification::Failed(reason) => reason.to_string(),
        }
    }

    pub fn metadata(&self) -> Option<&ImageMetadata> {
        match self {
            Classification::Passed(meta) => Some(meta),
            Classification::Failed(_) => None,
        }
    }
}

/// A row about to be appended to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub filename: String,
    pub metadata: Option<ImageMetadata>,
    pub status: ValidationStatus,
    pub notes: String,
    pub processed_timestamp: String,
}

impl NewRecord {
    /// Build a record from a classification. Failed records never carry metadata.
    pub fn from_classification(
        filename: impl Into<String>,
        classification: &Classification,
        processed_timestamp: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            metadata: classification.metadata().cloned(),
            status: classification.status(),
            notes: classification.notes(),
            processed_timestamp: processed_timestamp.into(),
        }
    }
}

/// A stored row.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub id: i64,
    pub filename: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub size_kb: Option<f64>,
    pub format: Option<String>,
    pub status: ValidationStatus,
    pub notes: Option<String>,
    pub processed_timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCount {
    pub status: ValidationStatus,
    pub count: usize,
}

/// Aggregate view of the store for operator reporting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreSummary {
    pub total: usize,
    pub by_status: Vec<StatusCount>,
}

impl StoreSummary {
    pub fn count_for(&self, status: ValidationStatus) -> usize {
        self.by_status
            .iter()
            .find(|c| c.status == status)
            .map(|c| c.count)
            .unwrap_or(0)
    }
}

/// Counters for a single pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    /// Non-file entries in the source directory.
    pub skipped: usize,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.passed + self.failed
    }
}
