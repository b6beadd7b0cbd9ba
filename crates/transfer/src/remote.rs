use std::future::Future;

/// The remote file service surface a transfer drives.
///
/// Implemented by the TCP client. Semantics follow the file service:
/// metadata calls report invalid paths as `false` / `0`, and
/// `Err` is reserved for transport or I/O faults.
pub trait RemoteFs: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Parent exists and the path is not a directory.
    fn path_valid(&self, path: &str) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// The path names a regular file.
    fn file_exists(&self, path: &str) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Byte length of the file, 0 if absent.
    fn file_length(&self, path: &str) -> impl Future<Output = Result<u64, Self::Error>> + Send;

    /// Removes a regular file.
    fn remove_file(&self, path: &str) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Appends the first `count` bytes of `data`; `false` if the append failed.
    fn write_chunk(
        &self,
        path: &str,
        data: &[u8],
        count: usize,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Reads up to one chunk at `offset`; empty at end-of-file.
    fn read_chunk(
        &self,
        path: &str,
        offset: u64,
    ) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send;
}
