//! Chunk primitives. Each call opens and closes its own file handle.

use std::io::SeekFrom;
use std::path::Path;

use rfshare_protocol::CHUNK_SIZE;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::FileServiceError;

/// Reads up to [`CHUNK_SIZE`] bytes starting at `offset`.
///
/// Returns fewer bytes at end-of-file and an empty buffer when `offset` is
/// at or past the end.
pub(crate) async fn read_at(path: &Path, offset: u64) -> Result<Vec<u8>, FileServiceError> {
    let metadata = tokio::fs::metadata(path).await?;
    if !metadata.is_file() {
        return Err(FileServiceError::NotAFile(path.display().to_string()));
    }

    let mut file = tokio::fs::File::open(path).await?;
    file.seek(SeekFrom::Start(offset)).await?;

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(buf)
}

/// Appends `data` to the file at `path`, creating it if absent.
///
/// On failure the file is cut back to its prior length so a partially
/// written chunk never survives.
pub(crate) async fn append(path: &Path, data: &[u8]) -> Result<(), FileServiceError> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    let prior_len = file.metadata().await?.len();

    let result = async {
        file.write_all(data).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = result {
        if let Err(rollback) = file.set_len(prior_len).await {
            tracing::warn!(
                path = %path.display(),
                prior_len,
                error = %rollback,
                "failed to roll back partial append"
            );
        }
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn read_full_then_partial_then_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        let data: Vec<u8> = (0..1500u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let first = read_at(&path, 0).await.unwrap();
        assert_eq!(first.len(), CHUNK_SIZE);
        assert_eq!(&first[..], &data[..CHUNK_SIZE]);

        let second = read_at(&path, CHUNK_SIZE as u64).await.unwrap();
        assert_eq!(&second[..], &data[CHUNK_SIZE..]);

        let at_eof = read_at(&path, 1500).await.unwrap();
        assert!(at_eof.is_empty());

        let past_eof = read_at(&path, 9000).await.unwrap();
        assert!(past_eof.is_empty());
    }

    #[tokio::test]
    async fn read_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = read_at(&dir.path().join("nope"), 0).await;
        assert!(matches!(result, Err(FileServiceError::Io(_))));
    }

    #[tokio::test]
    async fn read_directory_is_not_a_file() {
        let dir = TempDir::new().unwrap();
        let result = read_at(dir.path(), 0).await;
        assert!(matches!(result, Err(FileServiceError::NotAFile(_))));
    }

    #[tokio::test]
    async fn append_creates_then_extends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");

        append(&path, b"Hello").await.unwrap();
        append(&path, b" World").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"Hello World");
    }

    #[tokio::test]
    async fn append_to_directory_fails() {
        let dir = TempDir::new().unwrap();
        assert!(append(dir.path(), b"x").await.is_err());
    }
}
