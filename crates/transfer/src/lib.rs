//! Resumable chunked file transfer.
//!
//! [`TransferController`] moves one file between the local disk and a
//! [`RemoteFs`] in fixed-size chunks. Progress is reconstructed from the
//! destination's current length on every invocation: a resumed transfer
//! trusts that the existing prefix matches the source and never re-reads
//! it. There is no checksum.

mod chunked;
mod controller;
#[cfg(test)]
mod local;
mod policy;
mod progress;
mod remote;
mod retry;
mod session;

pub use chunked::ChunkReader;
pub use controller::{TransferController, TransferOutcome};
pub use policy::{DownloadPlan, UploadPlan, local_destination_valid, plan_download, plan_upload};
pub use progress::{ProgressCallback, SpeedCalculator, TransferProgress};
pub use remote::RemoteFs;
pub use retry::RetryPolicy;
pub use session::{Direction, TransferSession};

pub use rfshare_protocol::CHUNK_SIZE;

/// Boxed error from a remote implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("local path {0} is invalid")]
    InvalidLocalPath(String),

    #[error("remote path {0} is invalid")]
    InvalidRemotePath(String),

    #[error("source ended at offset {offset}, expected {expected} bytes")]
    SourceTruncated { offset: u64, expected: u64 },

    #[error("remote file {path} could not be replaced ({len} stale bytes remain)")]
    OverwriteRefused { path: String, len: u64 },

    #[error("write at offset {offset} failed after {attempts} attempts")]
    RetriesExhausted { offset: u64, attempts: u32 },

    #[error("remote call failed: {0}")]
    Remote(#[source] BoxError),

    #[error("session error: {0}")]
    Session(String),
}

impl TransferError {
    /// Wraps a transport or remote-side fault.
    pub fn remote<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TransferError::Remote(Box::new(err))
    }
}
