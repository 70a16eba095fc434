//! Error types for storage operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while touching the disk
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to delete directory {path}: {source}")]
    DirectoryDelete {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize completed jobs: {0}")]
    Serialize(serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
