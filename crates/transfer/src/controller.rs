use std::path::Path;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::chunked::ChunkReader;
use crate::policy::{DownloadPlan, UploadPlan, local_destination_valid, plan_download, plan_upload};
use crate::progress::{ProgressCallback, SpeedCalculator, TransferProgress};
use crate::remote::RemoteFs;
use crate::retry::RetryPolicy;
use crate::session::{Direction, TransferSession};
use crate::{CHUNK_SIZE, TransferError};

/// Summary of a finished transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub direction: Direction,
    /// Final size of the destination, equal to the source size.
    pub total_bytes: u64,
    /// Destination prefix that was trusted without verification.
    pub resumed_from: u64,
    /// Bytes moved by this invocation.
    pub bytes_transferred: u64,
    /// Successful chunk round trips (retries excluded).
    pub chunk_calls: u32,
}

/// Drives uploads and downloads against a [`RemoteFs`].
///
/// Each transfer is strictly sequential: one chunk call is awaited before
/// the next is issued.
pub struct TransferController<R: RemoteFs> {
    remote: R,
    retry: RetryPolicy,
    chunk_size: usize,
    progress: Option<ProgressCallback>,
}

impl<R: RemoteFs> TransferController<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            retry: RetryPolicy::default(),
            chunk_size: CHUNK_SIZE,
            progress: None,
        }
    }

    /// Sets the retry policy for failed chunk writes.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Registers a progress callback.
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    fn report(&self, session: &TransferSession, speed: &SpeedCalculator) {
        if let Some(cb) = &self.progress {
            cb(&TransferProgress::snapshot(session, speed.bytes_per_second()));
        }
    }

    // -----------------------------------------------------------------------
    // Upload
    // -----------------------------------------------------------------------

    /// Uploads `local_path` to `remote_path`, resuming a shorter remote file.
    ///
    /// A remote file at least as large as the local one is removed and sent
    /// again in full. Failed chunk writes are retried under the
    /// [`RetryPolicy`]; transport faults abort at once and leave the remote
    /// prefix in place for a later resume.
    pub async fn upload(
        &self,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<TransferOutcome, TransferError> {
        let is_file = tokio::fs::metadata(local_path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(TransferError::InvalidLocalPath(format!(
                "{} (not a file)",
                local_path.display()
            )));
        }
        if !self
            .remote
            .path_valid(remote_path)
            .await
            .map_err(TransferError::remote)?
        {
            return Err(TransferError::InvalidRemotePath(remote_path.to_string()));
        }

        let mut reader = ChunkReader::open(local_path, self.chunk_size).await?;
        let local_size = reader.file_size();
        let remote_size = self
            .remote
            .file_length(remote_path)
            .await
            .map_err(TransferError::remote)?;

        let start = match plan_upload(remote_size, local_size) {
            UploadPlan::Resume(offset) => {
                info!(remote_path, offset, local_size, "resuming upload");
                reader.seek_to(offset).await?;
                offset
            }
            UploadPlan::Overwrite => {
                let removed = self
                    .remote
                    .remove_file(remote_path)
                    .await
                    .map_err(TransferError::remote)?;
                if !removed {
                    // Appending onto a file that survived removal would leave
                    // stale bytes in front of the new content.
                    let left = self
                        .remote
                        .file_length(remote_path)
                        .await
                        .map_err(TransferError::remote)?;
                    if left > 0 {
                        warn!(remote_path, left, "remote file could not be removed");
                        return Err(TransferError::OverwriteRefused {
                            path: remote_path.to_string(),
                            len: left,
                        });
                    }
                }
                debug!(remote_path, remote_size, "overwriting remote file");
                0
            }
            UploadPlan::Fresh => 0,
        };

        let mut session = TransferSession::new(Direction::Upload, local_size, start, self.chunk_size)?;
        let mut speed = SpeedCalculator::default();
        let mut chunk_calls = 0u32;
        self.report(&session, &speed);

        if local_size == 0 {
            // Still create the destination so it mirrors the empty source.
            self.write_with_retry(remote_path, &[], 0).await?;
            chunk_calls += 1;
        }

        while !session.is_complete() {
            let offset = session.transferred();
            let chunk = reader
                .next_chunk()
                .await?
                .ok_or(TransferError::SourceTruncated {
                    offset,
                    expected: local_size,
                })?;

            debug_assert_eq!(chunk.len(), session.next_chunk_len());
            self.write_with_retry(remote_path, &chunk, offset).await?;
            session.advance(chunk.len() as u64)?;
            chunk_calls += 1;
            speed.record(chunk.len() as u64);
            debug!(remote_path, offset, len = chunk.len(), "chunk uploaded");
            self.report(&session, &speed);
        }

        info!(
            remote_path,
            total = local_size,
            resumed_from = start,
            chunk_calls,
            "upload complete"
        );
        Ok(TransferOutcome {
            direction: Direction::Upload,
            total_bytes: local_size,
            resumed_from: start,
            bytes_transferred: local_size - start,
            chunk_calls,
        })
    }

    async fn write_with_retry(
        &self,
        remote_path: &str,
        chunk: &[u8],
        offset: u64,
    ) -> Result<(), TransferError> {
        let max_attempts = self.retry.attempts();
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let written = self
                .remote
                .write_chunk(remote_path, chunk, chunk.len())
                .await
                .map_err(TransferError::remote)?;
            if written {
                return Ok(());
            }
            if attempt >= max_attempts {
                return Err(TransferError::RetriesExhausted {
                    offset,
                    attempts: attempt,
                });
            }

            let delay = self.retry.delay_for_attempt(attempt);
            warn!(
                remote_path,
                offset,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "chunk write rejected, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    // -----------------------------------------------------------------------
    // Download
    // -----------------------------------------------------------------------

    /// Downloads `remote_path` into `local_path`, appending to a shorter
    /// local file.
    ///
    /// A local file at least as large as the remote one is truncated and
    /// rewritten. A remote read that comes back empty before the expected
    /// size is reached aborts the transfer.
    pub async fn download(
        &self,
        remote_path: &str,
        local_path: &Path,
    ) -> Result<TransferOutcome, TransferError> {
        if !local_destination_valid(local_path).await {
            return Err(TransferError::InvalidLocalPath(local_path.display().to_string()));
        }
        if !self
            .remote
            .file_exists(remote_path)
            .await
            .map_err(TransferError::remote)?
        {
            return Err(TransferError::InvalidRemotePath(format!(
                "{remote_path} (not a file)"
            )));
        }

        let remote_size = self
            .remote
            .file_length(remote_path)
            .await
            .map_err(TransferError::remote)?;
        let local_len = match tokio::fs::metadata(local_path).await {
            Ok(m) if m.is_file() => Some(m.len()),
            _ => None,
        };

        let (mut file, start) = match plan_download(local_len, remote_size) {
            DownloadPlan::Resume(offset) => {
                info!(remote_path, offset, remote_size, "resuming download");
                let file = tokio::fs::OpenOptions::new()
                    .append(true)
                    .open(local_path)
                    .await?;
                (file, offset)
            }
            DownloadPlan::Fresh => (tokio::fs::File::create(local_path).await?, 0),
        };

        let mut session =
            TransferSession::new(Direction::Download, remote_size, start, self.chunk_size)?;
        let mut speed = SpeedCalculator::default();
        let mut chunk_calls = 0u32;
        self.report(&session, &speed);

        while !session.is_complete() {
            let offset = session.transferred();
            let data = self
                .remote
                .read_chunk(remote_path, offset)
                .await
                .map_err(TransferError::remote)?;
            if data.is_empty() {
                file.flush().await?;
                return Err(TransferError::SourceTruncated {
                    offset,
                    expected: remote_size,
                });
            }

            // Never write past the size observed at the start.
            let remaining = usize::try_from(session.remaining()).unwrap_or(usize::MAX);
            let take = data.len().min(remaining);
            file.write_all(&data[..take]).await?;
            session.advance(take as u64)?;
            chunk_calls += 1;
            speed.record(take as u64);
            debug!(remote_path, offset, len = take, "chunk downloaded");
            self.report(&session, &speed);
        }

        file.flush().await?;
        info!(
            remote_path,
            total = remote_size,
            resumed_from = start,
            chunk_calls,
            "download complete"
        );
        Ok(TransferOutcome {
            direction: Direction::Download,
            total_bytes: remote_size,
            resumed_from: start,
            bytes_transferred: remote_size - start,
            chunk_calls,
        })
    }
}
