pub mod types;

// Re-export commonly used types
pub use types::{
    total_duration, Chapter, ChapterId, DownloadJob, JobId, JobStatus,
};
