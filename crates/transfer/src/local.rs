//! In-process remote for tests: drives a [`FileService`] directly, without
//! a socket.

use rfshare_file_service::{FileService, FileServiceError};

use crate::remote::RemoteFs;

impl RemoteFs for FileService {
    type Error = FileServiceError;

    async fn path_valid(&self, path: &str) -> Result<bool, Self::Error> {
        Ok(FileService::path_valid(self, path).await)
    }

    async fn file_exists(&self, path: &str) -> Result<bool, Self::Error> {
        Ok(FileService::file_exists(self, path).await)
    }

    async fn file_length(&self, path: &str) -> Result<u64, Self::Error> {
        Ok(FileService::file_length(self, path).await)
    }

    async fn remove_file(&self, path: &str) -> Result<bool, Self::Error> {
        Ok(FileService::remove_file(self, path).await)
    }

    async fn write_chunk(&self, path: &str, data: &[u8], count: usize) -> Result<bool, Self::Error> {
        Ok(FileService::write_chunk(self, path, data, count).await)
    }

    async fn read_chunk(&self, path: &str, offset: u64) -> Result<Vec<u8>, Self::Error> {
        FileService::read_chunk(self, path, offset).await
    }
}
