//! Resume-versus-overwrite decisions, based purely on byte lengths.

use std::path::Path;

/// How an upload reconciles with what the remote already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPlan {
    /// The remote holds a shorter prefix; continue from its length.
    Resume(u64),
    /// The remote is at least as large as the source; remove it and resend
    /// everything. A byte-identical remote copy is still retransmitted.
    Overwrite,
    /// Nothing remote to reconcile; append from zero.
    Fresh,
}

/// How a download reconciles with the local file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPlan {
    /// The local file holds a shorter prefix; append from its length.
    Resume(u64),
    /// Create or truncate the local file and start from zero.
    Fresh,
}

/// Decides the upload starting point from the remote and local sizes.
pub fn plan_upload(remote_size: u64, local_size: u64) -> UploadPlan {
    if remote_size >= local_size {
        UploadPlan::Overwrite
    } else if remote_size > 0 {
        UploadPlan::Resume(remote_size)
    } else {
        UploadPlan::Fresh
    }
}

/// Decides the download starting point.
///
/// `local_len` is `None` when no local file exists.
pub fn plan_download(local_len: Option<u64>, remote_size: u64) -> DownloadPlan {
    match local_len {
        Some(len) if len > 0 && len < remote_size => DownloadPlan::Resume(len),
        _ => DownloadPlan::Fresh,
    }
}

/// Download destination check: the parent directory exists (or there is
/// none) and the path itself is not a directory.
pub async fn local_destination_valid(path: &Path) -> bool {
    let parent_ok = match path.parent() {
        None => true,
        Some(parent) if parent.as_os_str().is_empty() => true,
        Some(parent) => tokio::fs::metadata(parent)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false),
    };
    let is_dir = tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    parent_ok && !is_dir
}
