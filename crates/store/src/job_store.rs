//! Durable record of completed download jobs

use crate::error::{StoreError, StoreResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use talefetch_core::{DownloadJob, JobId};
use tempfile::NamedTempFile;

/// Completed jobs, loaded once at startup and rewritten atomically on
/// every mutation.
///
/// Active jobs are deliberately never persisted; an interrupted process
/// loses its in-flight downloads and starts over.
#[derive(Debug)]
pub struct PersistedJobStore {
    path: PathBuf,
    jobs: Vec<DownloadJob>,
}

impl PersistedJobStore {
    /// Loads the store at `path`. A missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if !path.exists() {
            log::info!(
                "no completed-jobs file at {}, starting empty",
                path.display()
            );
            return Ok(Self {
                path,
                jobs: Vec::new(),
            });
        }

        let contents = fs::read_to_string(&path).map_err(|e| StoreError::Read {
            path: path.clone(),
            source: e,
        })?;
        let jobs = serde_json::from_str(&contents).map_err(|e| StoreError::Parse {
            path: path.clone(),
            source: e,
        })?;
        Ok(Self { path, jobs })
    }

    pub fn all(&self) -> &[DownloadJob] {
        &self.jobs
    }

    pub fn get(&self, id: JobId) -> Option<&DownloadJob> {
        self.jobs.iter().find(|job| job.id == id)
    }

    /// Appends a completed job and writes the list out
    pub fn append(&mut self, job: DownloadJob) -> StoreResult<()> {
        self.jobs.push(job);
        self.save()
    }

    /// Removes by id and writes the list out. Removing an unknown id is
    /// a no-op.
    pub fn remove(&mut self, id: JobId) -> StoreResult<()> {
        let before = self.jobs.len();
        self.jobs.retain(|job| job.id != id);
        if self.jobs.len() == before {
            return Ok(());
        }
        self.save()
    }

    /// Writes via a temp file and atomic rename so the record is never
    /// left half-written
    fn save(&self) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(&self.jobs).map_err(StoreError::Serialize)?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| StoreError::DirectoryCreate {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.flush()?;
        temp.persist(&self.path).map_err(|e| StoreError::Write {
            path: self.path.clone(),
            source: e.error,
        })?;

        log::debug!("saved {} completed jobs to {}", self.jobs.len(), self.path.display());
        Ok(())
    }
}
