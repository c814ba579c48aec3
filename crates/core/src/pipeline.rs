use std::fs;
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::PipelineConfig;
use crate::domain::*;
use crate::error::{Error, Result};
use crate::inspector;
use crate::store::MetadataStore;

/// Progress events emitted while a run is in flight.
pub enum RunProgress {
    /// Source directory listed; `total` counts every entry, files or not.
    Start { total: usize },
    /// A file was classified, recorded, and moved.
    FileProcessed {
        path: PathBuf,
        destination: PathBuf,
        status: ValidationStatus,
    },
    /// A non-file entry was skipped.
    Skipped { path: PathBuf },
    /// Run completed.
    Complete { summary: RunSummary },
}

/// Drives one pass over the source directory.
pub struct Pipeline {
    config: PipelineConfig,
    store: MetadataStore,
}

impl Pipeline {
    /// Open the store named by `config` and build a pipeline around it.
    pub fn open(config: PipelineConfig) -> Result<Self> {
        let store = MetadataStore::open(&config.store_path)?;
        Ok(Self { config, store })
    }

    /// Build a pipeline around an already open store.
    pub fn with_store(config: PipelineConfig, store: MetadataStore) -> Self {
        Self { config, store }
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// Process every regular file in the source directory exactly once.
    ///
    /// Each file's record is committed right after the file lands in its
    /// outcome directory. A store or move failure aborts the run; files handled
    /// before it stay both moved and recorded.
    pub fn run(
        &mut self,
        mut progress_cb: Option<&mut dyn FnMut(RunProgress)>,
    ) -> Result<RunSummary> {
        let source = &self.config.source_dir;
        if !source.exists() {
            return Err(Error::SourceNotFound(source.clone()));
        }
        if !source.is_dir() {
            return Err(Error::SourceNotDirectory(source.clone()));
        }

        fs::create_dir_all(&self.config.validated_dir)?;
        fs::create_dir_all(&self.config.rejected_dir)?;

        let entries = list_entries(source)?;
        info!(source = %source.display(), entries = entries.len(), "starting pipeline run");

        if let Some(ref mut cb) = progress_cb {
            cb(RunProgress::Start {
                total: entries.len(),
            });
        }

        let mut summary = RunSummary::default();

        for path in entries {
            if !path.is_file() {
                summary.skipped += 1;
                if let Some(ref mut cb) = progress_cb {
                    cb(RunProgress::Skipped { path });
                }
                continue;
            }

            let (status, destination) = self.process_file(&path)?;
            match status {
                ValidationStatus::Passed => summary.passed += 1,
                ValidationStatus::Failed => summary.failed += 1,
            }

            if let Some(ref mut cb) = progress_cb {
                cb(RunProgress::FileProcessed {
                    path,
                    destination,
                    status,
                });
            }
        }

        info!(
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            "pipeline run complete"
        );

        if let Some(ref mut cb) = progress_cb {
            cb(RunProgress::Complete { summary });
        }

        Ok(summary)
    }

    fn process_file(&mut self, path: &Path) -> Result<(ValidationStatus, PathBuf)> {
        let filename = path
            .file_name()
            .ok_or_else(|| Error::NoFileName(path.to_path_buf()))?
            .to_string_lossy()
            .into_owned();

        let classification = inspector::inspect(path, &self.config.policy);
        let record = NewRecord::from_classification(filename, &classification, now_timestamp());

        let dest_dir = match record.status {
            ValidationStatus::Passed => &self.config.validated_dir,
            ValidationStatus::Failed => &self.config.rejected_dir,
        };

        let (id, destination) = self
            .store
            .append_then(&record, || relocate(path, dest_dir))?;

        info!(
            id,
            file = %record.filename,
            status = %record.status,
            notes = %record.notes,
            "processed"
        );
        Ok((record.status, destination))
    }
}

/// Immediate children of `dir`, sorted by file name.
fn list_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        entries.push(entry?.into_path());
    }
    Ok(entries)
}

/// ISO-8601 local time with microseconds, e.g. `2024-05-01T10:00:00.123456+02:00`.
fn now_timestamp() -> String {
    chrono::Local::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Move `path` into `dest_dir` under its base name.
/// Falls back to copy + remove when a rename is not possible (e.g. across filesystems).
/// An existing file at the destination is overwritten.
pub fn relocate(path: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| Error::NoFileName(path.to_path_buf()))?;
    let target = dest_dir.join(name);

    if target.exists() {
        warn!(target = %target.display(), "destination exists, overwriting");
    }

    if fs::rename(path, &target).is_ok() {
        return Ok(target);
    }

    fs::copy(path, &target)
        .and_then(|_| fs::remove_file(path))
        .map_err(|source| Error::MoveFailed {
            from: path.to_path_buf(),
            to: target.clone(),
            source,
        })?;
    Ok(target)
}
