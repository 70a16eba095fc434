//! Seam between the orchestrator and the transfer layer

use async_trait::async_trait;
use std::sync::Arc;
use talefetch_network::{NetworkResult, ProgressUpdate, TransferComplete, TransferExecutor};
use tokio::sync::mpsc;

/// One chapter transfer: stream a URL to a temporary file, reporting
/// progress along the way.
///
/// Implemented by the real HTTP executor and by scripted doubles in
/// tests; the orchestrator is generic over it.
#[async_trait]
pub trait ChapterTransfer: Send + Sync {
    async fn transfer(
        &self,
        url: &str,
        progress_tx: mpsc::Sender<ProgressUpdate>,
    ) -> NetworkResult<TransferComplete>;
}

#[async_trait]
impl ChapterTransfer for TransferExecutor {
    async fn transfer(
        &self,
        url: &str,
        progress_tx: mpsc::Sender<ProgressUpdate>,
    ) -> NetworkResult<TransferComplete> {
        TransferExecutor::transfer(self, url, progress_tx).await
    }
}

#[async_trait]
impl<T: ChapterTransfer + ?Sized> ChapterTransfer for Arc<T> {
    async fn transfer(
        &self,
        url: &str,
        progress_tx: mpsc::Sender<ProgressUpdate>,
    ) -> NetworkResult<TransferComplete> {
        (**self).transfer(url, progress_tx).await
    }
}
