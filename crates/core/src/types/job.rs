//! Download job domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Unique identifier for a download job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    /// Creates a new random JobId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a JobId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Returns the JobId as a string
    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a download job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobStatus {
    Downloading,
    Completed,
    Failed { reason: String },
}

impl JobStatus {
    /// Returns true once the job can no longer make progress
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Downloading)
    }
}

/// One book's end-to-end multi-chapter download.
///
/// Mutated only by the orchestrator while active; the completed form is
/// what gets persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadJob {
    pub id: JobId,
    pub title: String,
    pub cover_url: Option<String>,
    /// Per-chapter byte estimates. Weighting for the overall fraction
    /// only; entries are refreshed with real sizes as transfers report
    /// them.
    pub chapter_sizes: Vec<u64>,
    /// 1-based; `total_chapters() + 1` once every chapter is written.
    pub current_chapter: usize,
    /// Fraction of the current chapter in [0, 1]. Monotonically
    /// non-decreasing within a chapter.
    pub chapter_progress: f64,
    /// Derived from the size table, never set independently.
    pub overall_progress: f64,
    pub status: JobStatus,
    /// Smoothed transfer rates in bytes per second.
    pub overall_rate: f64,
    pub chapter_rate: f64,
    pub directory: PathBuf,
    pub total_duration: String,
    /// Set exactly once, when the last chapter's write succeeds.
    pub completed_at: Option<DateTime<Utc>>,
}

impl DownloadJob {
    /// Creates a job in its initial `Downloading(1, 0)` state
    pub fn new(
        title: String,
        cover_url: Option<String>,
        chapter_sizes: Vec<u64>,
        directory: PathBuf,
        total_duration: String,
    ) -> Self {
        Self {
            id: JobId::new(),
            title,
            cover_url,
            chapter_sizes,
            current_chapter: 1,
            chapter_progress: 0.0,
            overall_progress: 0.0,
            status: JobStatus::Downloading,
            overall_rate: 0.0,
            chapter_rate: 0.0,
            directory,
            total_duration,
            completed_at: None,
        }
    }

    pub fn total_chapters(&self) -> usize {
        self.chapter_sizes.len()
    }

    /// Estimated bytes downloaded so far: every finished chapter in full
    /// plus the in-progress fraction of the current one.
    pub fn downloaded_bytes(&self) -> f64 {
        let finished = self
            .current_chapter
            .saturating_sub(1)
            .min(self.chapter_sizes.len());
        let mut bytes: f64 = self.chapter_sizes[..finished].iter().map(|&b| b as f64).sum();
        if self.current_chapter >= 1 {
            if let Some(&current) = self.chapter_sizes.get(self.current_chapter - 1) {
                bytes += current as f64 * self.chapter_progress;
            }
        }
        bytes
    }

    /// Sum of all chapter size estimates
    pub fn total_bytes(&self) -> f64 {
        self.chapter_sizes.iter().map(|&b| b as f64).sum()
    }

    /// Recomputes the derived overall fraction from the size table
    pub fn recompute_overall(&mut self) {
        let total = self.total_bytes();
        if total > 0.0 {
            self.overall_progress = (self.downloaded_bytes() / total).clamp(0.0, 1.0);
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
