// crates/network/src/error.rs
//! Error types for network operations

use thiserror::Error;

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors that can occur during network operations
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Transport-level failure (DNS, TLS, connection reset)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// IO error while spooling the response body
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered with a non-success status
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// The body was too small to be a media file. Mirrors serve HTML
    /// error pages with a 200 status; anything under the floor is one.
    #[error("response too small to be a media file ({bytes} bytes)")]
    ResponseTooSmall { bytes: u64 },

    /// No data arrived within the stall window
    #[error("transfer stalled: no data for {seconds}s")]
    Stalled { seconds: u64 },

    /// Invalid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl NetworkError {
    /// Returns the HTTP status code, if this error carries one
    pub fn status(&self) -> Option<u16> {
        match self {
            NetworkError::HttpStatus(code) => Some(*code),
            NetworkError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
