// crates/network/src/transfer.rs
//! Single GET-to-file transfer with streaming progress

use crate::client::Client;
use crate::error::{NetworkError, NetworkResult};
use futures::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::sync::mpsc;

/// Floor below which a completed body is treated as a disguised error
/// page rather than a media file.
pub const MIN_VALID_RESPONSE_BYTES: u64 = 1000;

const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Byte-level progress for one in-flight transfer. Monotonic within
/// the transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub bytes_written: u64,
    pub bytes_expected: Option<u64>,
}

/// A finished transfer.
///
/// The temporary file deletes itself on drop, so a transfer that is
/// abandoned mid-flight never leaves a partial file behind; callers
/// persist it into the book directory to keep the bytes.
#[derive(Debug)]
pub struct TransferComplete {
    pub file: NamedTempFile,
    pub bytes: u64,
}

/// Executes GET-to-file transfers.
///
/// Any number of transfers may run concurrently across different
/// downloads; the orchestrator never issues two for the same job.
#[derive(Clone)]
pub struct TransferExecutor {
    client: Client,
    /// Spool directory for in-flight bodies. Must live on the same
    /// filesystem as the final book directories so the commit rename
    /// stays atomic.
    spool_dir: PathBuf,
    stall_timeout: Duration,
}

impl TransferExecutor {
    pub fn new(client: Client, spool_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            spool_dir: spool_dir.into(),
            stall_timeout: DEFAULT_STALL_TIMEOUT,
        }
    }

    /// Overrides the stall window after which a silent connection is
    /// abandoned
    pub fn with_stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout = timeout;
        self
    }

    /// Streams `url` into a temporary file, reporting progress on
    /// `progress_tx` as chunks arrive.
    ///
    /// Progress delivery is best-effort: a full channel drops the
    /// sample instead of stalling the transfer.
    pub async fn transfer(
        &self,
        url: &str,
        progress_tx: mpsc::Sender<ProgressUpdate>,
    ) -> NetworkResult<TransferComplete> {
        let response = self.client.get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::HttpStatus(status.as_u16()));
        }
        let bytes_expected = response.content_length();

        let mut file = NamedTempFile::new_in(&self.spool_dir)?;
        let mut stream = response.bytes_stream();
        let mut bytes_written = 0u64;

        loop {
            let next = tokio::time::timeout(self.stall_timeout, stream.next()).await;
            let chunk = match next {
                Ok(Some(Ok(chunk))) => chunk,
                Ok(Some(Err(e))) => return Err(NetworkError::Transport(e)),
                Ok(None) => break,
                Err(_) => {
                    return Err(NetworkError::Stalled {
                        seconds: self.stall_timeout.as_secs(),
                    })
                }
            };

            file.write_all(&chunk)?;
            bytes_written += chunk.len() as u64;
            let _ = progress_tx.try_send(ProgressUpdate {
                bytes_written,
                bytes_expected,
            });
        }
        file.flush()?;

        if bytes_written < MIN_VALID_RESPONSE_BYTES {
            log::warn!(
                "{} answered with {} bytes, rejecting as an error page",
                url,
                bytes_written
            );
            return Err(NetworkError::ResponseTooSmall {
                bytes: bytes_written,
            });
        }

        log::debug!("transferred {} bytes from {}", bytes_written, url);
        Ok(TransferComplete {
            file,
            bytes: bytes_written,
        })
    }
}
