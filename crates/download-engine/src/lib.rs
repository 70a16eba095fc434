// crates/download-engine/src/lib.rs
//! Multi-chapter download orchestration
//!
//! The orchestrator owns every in-flight download job: it sequences
//! chapters strictly one at a time per job, applies the
//! primary-then-fallback mirror policy on failure, aggregates byte
//! progress across chapters, and emits lifecycle events for
//! presentation layers to consume.

mod error;
mod estimate;
mod events;
mod orchestrator;
mod transfer_source;

pub use error::{EngineError, EngineResult};
pub use estimate::{estimate_all, estimate_chapter_bytes};
pub use events::{format_rate, JobEvent};
pub use orchestrator::{DownloadOrchestrator, JobRequest, OrchestratorConfig};
pub use transfer_source::ChapterTransfer;
