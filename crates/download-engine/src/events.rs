//! Job lifecycle events

use serde::{Deserialize, Serialize};
use talefetch_core::JobId;

/// Lifecycle and progress notifications emitted by the orchestrator.
///
/// Progress events are at-least-once and may be dropped when a
/// subscriber lags; terminal events (`Completed`, `Failed`,
/// `Cancelled`) are emitted exactly once per job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JobEvent {
    Started {
        job_id: JobId,
    },
    Progress {
        job_id: JobId,
        current_chapter: usize,
        chapter_progress: f64,
        overall_progress: f64,
        /// Bytes per second over the rate window
        chapter_rate: f64,
        overall_rate: f64,
    },
    Completed {
        job_id: JobId,
    },
    Failed {
        job_id: JobId,
        reason: String,
    },
    Cancelled {
        job_id: JobId,
    },
}

impl JobEvent {
    pub fn job_id(&self) -> JobId {
        match self {
            JobEvent::Started { job_id }
            | JobEvent::Progress { job_id, .. }
            | JobEvent::Completed { job_id }
            | JobEvent::Failed { job_id, .. }
            | JobEvent::Cancelled { job_id } => *job_id,
        }
    }

    /// Returns true for events after which no more will follow
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobEvent::Completed { .. } | JobEvent::Failed { .. } | JobEvent::Cancelled { .. }
        )
    }
}

/// Renders a byte rate for display: `"1.2 MB/s"`, `"850 KB/s"`
pub fn format_rate(bytes_per_sec: f64) -> String {
    if bytes_per_sec >= 1_000_000.0 {
        format!("{:.1} MB/s", bytes_per_sec / 1_000_000.0)
    } else if bytes_per_sec >= 1_000.0 {
        format!("{:.0} KB/s", bytes_per_sec / 1_000.0)
    } else {
        format!("{:.0} B/s", bytes_per_sec)
    }
}
