// crates/download-engine/src/orchestrator.rs
//! Central download state machine
//!
//! One driver task per job serializes every mutation for that job;
//! the shared job maps sit behind a single lock so progress readers
//! never observe a half-applied transition. Jobs progress
//! independently of each other, chapters within a job never overlap.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use talefetch_core::{total_duration, Chapter, DownloadJob, JobId, JobStatus};
use talefetch_network::{NetworkResult, ProgressUpdate, RateEstimator, TransferComplete};
use talefetch_sources::{is_absolute_url, resolve, Candidate, ResolveError, SourceId};
use talefetch_store::{FileStore, PersistedJobStore};
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::error::{EngineError, EngineResult};
use crate::estimate;
use crate::events::JobEvent;
use crate::transfer_source::ChapterTransfer;

/// Tuning knobs for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
    /// Capacity of the per-transfer progress channel
    pub progress_capacity: usize,
    /// Sliding window for rate estimation
    pub rate_window: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            event_capacity: 256,
            progress_capacity: 64,
            rate_window: Duration::from_secs(5),
        }
    }
}

/// Everything needed to start one job
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub title: String,
    pub cover_url: Option<String>,
    pub chapters: Vec<Chapter>,
    pub source: Option<SourceId>,
}

struct ActiveJob {
    job: DownloadJob,
    handle: Option<JoinHandle<()>>,
}

struct Inner<T> {
    transfer: T,
    files: FileStore,
    config: OrchestratorConfig,
    active: RwLock<HashMap<JobId, ActiveJob>>,
    completed: Mutex<PersistedJobStore>,
    events: broadcast::Sender<JobEvent>,
}

impl<T> Inner<T> {
    /// Fire-and-forget; a send with no subscribers is not an error
    fn emit(&self, event: JobEvent) {
        let _ = self.events.send(event);
    }
}

/// Owns every in-flight and completed download job.
///
/// Constructed once by the application's composition root and shared by
/// reference; there is no ambient global instance.
pub struct DownloadOrchestrator<T: ChapterTransfer + 'static> {
    inner: Arc<Inner<T>>,
}

impl<T: ChapterTransfer + 'static> DownloadOrchestrator<T> {
    pub fn new(
        transfer: T,
        files: FileStore,
        completed: PersistedJobStore,
        config: OrchestratorConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        Self {
            inner: Arc::new(Inner {
                transfer,
                files,
                config,
                active: RwLock::new(HashMap::new()),
                completed: Mutex::new(completed),
                events,
            }),
        }
    }

    /// Subscribes to job lifecycle events. Progress events may be
    /// dropped when the subscriber lags; terminal events are reliable
    /// as long as the receiver keeps up with the channel capacity.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.inner.events.subscribe()
    }

    /// Validates the request, creates the job and its directory, and
    /// begins downloading chapter 1.
    ///
    /// Input errors (empty chapter list, relative URLs without a
    /// source) fail here synchronously; no job is created.
    pub async fn start_job(&self, request: JobRequest) -> EngineResult<JobId> {
        let source = request.source;

        let chapters: Vec<Chapter> = request
            .chapters
            .into_iter()
            .filter(|chapter| {
                source.map_or(true, |s| chapter.url != s.filler_chapter_url())
            })
            .collect();

        if chapters.is_empty() {
            return Err(EngineError::EmptyChapterList);
        }
        if source.is_none() {
            if let Some(relative) = chapters.iter().find(|c| !is_absolute_url(&c.url)) {
                return Err(EngineError::NoSource(relative.name.clone()));
            }
        }

        let sizes = estimate::estimate_all(&chapters);
        let directory = self.inner.files.create_book_directory(&request.title)?;
        let job = DownloadJob::new(
            request.title,
            request.cover_url,
            sizes,
            directory,
            total_duration(&chapters),
        );
        let job_id = job.id;

        {
            let mut active = self.inner.active.write().await;
            active.insert(job_id, ActiveJob { job, handle: None });
        }
        self.inner.emit(JobEvent::Started { job_id });
        log::info!(
            "job {}: started, {} chapters",
            job_id,
            chapters.len()
        );

        let handle = tokio::spawn(run_job(
            Arc::clone(&self.inner),
            job_id,
            chapters,
            source,
        ));
        if let Some(entry) = self.inner.active.write().await.get_mut(&job_id) {
            entry.handle = Some(handle);
        }

        Ok(job_id)
    }

    /// Aborts any in-flight transfer, removes the job from the active
    /// set, and deletes its directory. Idempotent; cancelling an
    /// unknown or already-cancelled job is a no-op.
    pub async fn cancel(&self, job_id: JobId) -> EngineResult<()> {
        let removed = {
            let mut active = self.inner.active.write().await;
            active.remove(&job_id)
        };
        let Some(entry) = removed else {
            return Ok(());
        };

        if let Some(handle) = entry.handle {
            handle.abort();
        }
        self.inner.files.delete_book_directory(&entry.job.title)?;
        self.inner.emit(JobEvent::Cancelled { job_id });
        log::info!("job {}: cancelled", job_id);
        Ok(())
    }

    /// Deletes a completed job's directory and drops its record.
    /// Idempotent.
    pub async fn remove_completed(&self, job_id: JobId) -> EngineResult<()> {
        let mut completed = self.inner.completed.lock().await;
        let Some(job) = completed.get(job_id).cloned() else {
            return Ok(());
        };
        self.inner.files.delete_book_directory(&job.title)?;
        completed.remove(job_id)?;
        log::info!("job {}: removed completed record", job_id);
        Ok(())
    }

    /// Snapshot of the in-flight (and failed-but-listed) jobs
    pub async fn active_jobs(&self) -> Vec<DownloadJob> {
        let active = self.inner.active.read().await;
        active.values().map(|entry| entry.job.clone()).collect()
    }

    /// Snapshot of the durable completed-job list
    pub async fn completed_jobs(&self) -> Vec<DownloadJob> {
        let completed = self.inner.completed.lock().await;
        completed.all().to_vec()
    }

    /// Snapshot of one job, active or completed
    pub async fn job(&self, job_id: JobId) -> Option<DownloadJob> {
        {
            let active = self.inner.active.read().await;
            if let Some(entry) = active.get(&job_id) {
                return Some(entry.job.clone());
            }
        }
        let completed = self.inner.completed.lock().await;
        completed.get(job_id).cloned()
    }
}

enum ChapterOutcome {
    Done,
    JobGone,
    Failed(String),
}

enum CommitResult {
    Advanced,
    JobGone,
    Failed(String),
}

/// Driver task: chapters strictly sequential, one transfer at a time
async fn run_job<T: ChapterTransfer>(
    inner: Arc<Inner<T>>,
    job_id: JobId,
    chapters: Vec<Chapter>,
    source: Option<SourceId>,
) {
    let mut overall_rate = RateEstimator::new(inner.config.rate_window);
    let mut completed_bytes: u64 = 0;

    for (index, chapter) in chapters.iter().enumerate() {
        let chapter_no = index + 1;
        match download_chapter(
            &inner,
            job_id,
            chapter_no,
            chapter,
            source,
            &mut overall_rate,
            &mut completed_bytes,
        )
        .await
        {
            ChapterOutcome::Done => {}
            ChapterOutcome::JobGone => return,
            ChapterOutcome::Failed(reason) => {
                fail_job(&inner, job_id, reason).await;
                return;
            }
        }
    }

    complete_job(&inner, job_id).await;
}

/// Tries each candidate URL in order; the fallback mirror is the only
/// retry permitted
async fn download_chapter<T: ChapterTransfer>(
    inner: &Arc<Inner<T>>,
    job_id: JobId,
    chapter_no: usize,
    chapter: &Chapter,
    source: Option<SourceId>,
    overall_rate: &mut RateEstimator,
    completed_bytes: &mut u64,
) -> ChapterOutcome {
    let candidates = match resolve(chapter, source) {
        Ok(candidates) => candidates,
        Err(e) => return ChapterOutcome::Failed(chapter_failure(chapter, &e.to_string())),
    };

    let mut last_cause: Option<String> = None;
    for candidate in &candidates {
        if !job_is_active(inner, job_id).await {
            return ChapterOutcome::JobGone;
        }

        log::info!(
            "job {}: chapter {} via {:?} {}",
            job_id,
            chapter_no,
            candidate.origin,
            candidate.url
        );
        match attempt_candidate(
            inner,
            job_id,
            chapter_no,
            candidate,
            overall_rate,
            *completed_bytes,
        )
        .await
        {
            Ok(complete) => {
                return match commit_chapter(
                    inner,
                    job_id,
                    chapter_no,
                    chapter,
                    complete,
                    completed_bytes,
                )
                .await
                {
                    CommitResult::Advanced => ChapterOutcome::Done,
                    CommitResult::JobGone => ChapterOutcome::JobGone,
                    CommitResult::Failed(reason) => ChapterOutcome::Failed(reason),
                };
            }
            Err(e) => {
                log::warn!(
                    "job {}: chapter {} attempt {} failed: {}",
                    job_id,
                    chapter_no,
                    candidate.url,
                    e
                );
                last_cause = Some(e.to_string());
            }
        }
    }

    let cause = last_cause.unwrap_or_else(|| {
        ResolveError::NoCandidatesRemaining(chapter.name.clone()).to_string()
    });
    ChapterOutcome::Failed(chapter_failure(chapter, &cause))
}

fn chapter_failure(chapter: &Chapter, cause: &str) -> String {
    format!("Failed to download chapter {}: {}", chapter.name, cause)
}

/// Runs one transfer, funneling its progress samples into the job
/// state until the terminal outcome arrives
async fn attempt_candidate<T: ChapterTransfer>(
    inner: &Arc<Inner<T>>,
    job_id: JobId,
    chapter_no: usize,
    candidate: &Candidate,
    overall_rate: &mut RateEstimator,
    completed_bytes: u64,
) -> NetworkResult<TransferComplete> {
    let (tx, mut rx) = mpsc::channel(inner.config.progress_capacity);
    let mut chapter_rate = RateEstimator::new(inner.config.rate_window);

    let transfer = inner.transfer.transfer(&candidate.url, tx);
    tokio::pin!(transfer);

    // Drain progress ahead of the outcome so a buffered sample is never
    // applied after the transfer's terminal result
    loop {
        tokio::select! {
            biased;
            update = rx.recv() => {
                match update {
                    Some(update) => {
                        apply_progress(
                            inner,
                            job_id,
                            chapter_no,
                            update,
                            &mut chapter_rate,
                            overall_rate,
                            completed_bytes,
                        )
                        .await;
                    }
                    // Sender gone; the outcome is next
                    None => break,
                }
            }
            result = &mut transfer => return result,
        }
    }

    transfer.await
}

/// Applies one progress sample under the monotonic guard and publishes
/// the recomputed aggregate. Samples for a cancelled job are no-ops.
async fn apply_progress<T>(
    inner: &Arc<Inner<T>>,
    job_id: JobId,
    chapter_no: usize,
    update: ProgressUpdate,
    chapter_rate: &mut RateEstimator,
    overall_rate: &mut RateEstimator,
    completed_bytes: u64,
) {
    let event = {
        let mut active = inner.active.write().await;
        let Some(entry) = active.get_mut(&job_id) else {
            return;
        };
        let job = &mut entry.job;
        if job.status != JobStatus::Downloading {
            return;
        }

        // Refresh the weighting table with the server's real size
        if let Some(expected) = update.bytes_expected {
            if expected > 0 && job.chapter_sizes[chapter_no - 1] != expected {
                job.chapter_sizes[chapter_no - 1] = expected;
            }
        }

        let size = job.chapter_sizes[chapter_no - 1].max(1);
        let fraction = (update.bytes_written as f64 / size as f64).min(1.0);
        // Out-of-order or duplicate samples never decrease progress
        if fraction <= job.chapter_progress {
            return;
        }

        job.chapter_progress = fraction;
        chapter_rate.record(update.bytes_written);
        overall_rate.record(completed_bytes + update.bytes_written);
        job.chapter_rate = chapter_rate.rate();
        job.overall_rate = overall_rate.rate();
        job.recompute_overall();

        JobEvent::Progress {
            job_id,
            current_chapter: job.current_chapter,
            chapter_progress: job.chapter_progress,
            overall_progress: job.overall_progress,
            chapter_rate: job.chapter_rate,
            overall_rate: job.overall_rate,
        }
    };
    inner.emit(event);
}

/// Moves the finished transfer into the book directory and advances the
/// job to the next chapter
async fn commit_chapter<T>(
    inner: &Arc<Inner<T>>,
    job_id: JobId,
    chapter_no: usize,
    chapter: &Chapter,
    complete: TransferComplete,
    completed_bytes: &mut u64,
) -> CommitResult {
    let event = {
        let mut active = inner.active.write().await;
        let Some(entry) = active.get_mut(&job_id) else {
            return CommitResult::JobGone;
        };

        if let Err(e) = inner.files.commit_chapter(
            complete.file,
            &entry.job.directory,
            chapter_no,
            &chapter.name,
        ) {
            return CommitResult::Failed(chapter_failure(chapter, &e.to_string()));
        }

        let job = &mut entry.job;
        job.chapter_sizes[chapter_no - 1] = complete.bytes;
        job.current_chapter = chapter_no + 1;
        job.chapter_progress = 0.0;
        job.chapter_rate = 0.0;
        job.recompute_overall();
        *completed_bytes += complete.bytes;

        JobEvent::Progress {
            job_id,
            current_chapter: job.current_chapter,
            chapter_progress: job.chapter_progress,
            overall_progress: job.overall_progress,
            chapter_rate: job.chapter_rate,
            overall_rate: job.overall_rate,
        }
    };
    inner.emit(event);
    CommitResult::Advanced
}

/// Moves the job from the active set to the durable completed store.
/// Runs exactly once per job, after the last chapter's write.
async fn complete_job<T>(inner: &Arc<Inner<T>>, job_id: JobId) {
    let removed = {
        let mut active = inner.active.write().await;
        active.remove(&job_id)
    };
    let Some(mut entry) = removed else {
        return;
    };

    entry.job.status = JobStatus::Completed;
    entry.job.overall_progress = 1.0;
    entry.job.overall_rate = 0.0;
    entry.job.chapter_rate = 0.0;
    entry.job.completed_at = Some(Utc::now());

    {
        let mut completed = inner.completed.lock().await;
        if let Err(e) = completed.append(entry.job) {
            log::warn!("job {}: failed to persist completed record: {}", job_id, e);
        }
    }
    inner.emit(JobEvent::Completed { job_id });
    log::info!("job {}: completed", job_id);
}

/// Marks the job failed; it stays listed with its reason until the user
/// cancels or retries it
async fn fail_job<T>(inner: &Arc<Inner<T>>, job_id: JobId, reason: String) {
    {
        let mut active = inner.active.write().await;
        let Some(entry) = active.get_mut(&job_id) else {
            return;
        };
        if entry.job.status.is_terminal() {
            return;
        }
        entry.job.status = JobStatus::Failed {
            reason: reason.clone(),
        };
    }
    inner.emit(JobEvent::Failed { job_id, reason });
    log::warn!("job {}: failed", job_id);
}

async fn job_is_active<T>(inner: &Arc<Inner<T>>, job_id: JobId) -> bool {
    let active = inner.active.read().await;
    active
        .get(&job_id)
        .map(|entry| entry.job.status == JobStatus::Downloading)
        .unwrap_or(false)
}
