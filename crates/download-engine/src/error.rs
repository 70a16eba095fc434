//! Error types for the download engine

use talefetch_store::StoreError;
use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors returned synchronously from orchestrator calls.
///
/// Per-chapter transfer failures are not here: they surface through a
/// job's `Failed` status and the event stream, scoped to that one job.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The chapter list was empty (possibly after filler exclusion)
    #[error("chapter list is empty")]
    EmptyChapterList,

    /// A relative chapter URL cannot be resolved without a source
    #[error("no source matched and chapter '{0}' has a relative URL")]
    NoSource(String),

    /// Storage failure while setting up or tearing down a job
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
