use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::FileServiceError;
use crate::chunk;
use crate::validation::validate_relative_path;

/// File service configuration.
#[derive(Debug, Clone)]
pub struct FileServiceConfig {
    /// Working root every caller-supplied path is resolved against.
    pub root: PathBuf,
    /// Reject paths that would escape `root` (`..`, drive prefixes).
    pub confine_paths: bool,
}

impl Default for FileServiceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            confine_paths: false,
        }
    }
}

/// The server-side view of a filesystem namespace.
///
/// Metadata queries never fail: unusable paths answer `false`, `None` or
/// `0`. Only [`read_chunk`](Self::read_chunk) reports faults, since an empty
/// buffer would be indistinguishable from end-of-file.
///
/// No cross-call locking is performed. Two writers appending to the same
/// path interleave at call granularity; callers must serialize access.
#[derive(Debug, Clone)]
pub struct FileService {
    root: PathBuf,
    confine_paths: bool,
}

impl FileService {
    pub fn new(config: FileServiceConfig) -> Self {
        Self {
            root: config.root,
            confine_paths: config.confine_paths,
        }
    }

    /// Returns the working root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a caller-supplied path against the root.
    ///
    /// Leading separators are stripped, so `/` names the root itself and
    /// `/docs/a.txt` names `<root>/docs/a.txt`. Without confinement, `..`
    /// components are passed through to the host filesystem untouched.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, FileServiceError> {
        let relative = path.trim_start_matches(['/', '\\']);
        if self.confine_paths {
            validate_relative_path(relative)?;
        }
        if relative.is_empty() {
            return Ok(self.root.clone());
        }
        Ok(self.root.join(relative))
    }

    fn resolve_or_log(&self, op: &str, path: &str) -> Option<PathBuf> {
        match self.resolve(path) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(op, path, error = %e, "rejected path");
                None
            }
        }
    }

    /// True iff the parent directory exists (or there is none) and the
    /// path itself is not a directory. The target need not exist.
    pub async fn path_valid(&self, path: &str) -> bool {
        let Some(resolved) = self.resolve_or_log("filepathValid", path) else {
            return false;
        };

        let parent_ok = match resolved.parent() {
            None => true,
            Some(parent) if parent.as_os_str().is_empty() => true,
            Some(parent) => is_dir(parent).await,
        };

        parent_ok && !is_dir(&resolved).await
    }

    /// True iff the path names an existing regular file.
    pub async fn file_exists(&self, path: &str) -> bool {
        match self.resolve_or_log("fileExists", path) {
            Some(resolved) => is_file(&resolved).await,
            None => false,
        }
    }

    /// Byte length of the file at `path`; 0 when absent or not a file.
    pub async fn file_length(&self, path: &str) -> u64 {
        let Some(resolved) = self.resolve_or_log("getFileLength", path) else {
            return 0;
        };
        match tokio::fs::metadata(&resolved).await {
            Ok(m) if m.is_file() => m.len(),
            _ => 0,
        }
    }

    /// Lists the entry names of a directory, sorted.
    ///
    /// `None` means the path is not a readable directory; a valid empty
    /// directory yields `Some(vec![])`.
    pub async fn list_directory(&self, path: &str) -> Option<Vec<String>> {
        let resolved = self.resolve_or_log("dir", path)?;

        let mut entries = match tokio::fs::read_dir(&resolved).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(path = %resolved.display(), error = %e, "dir: not a directory");
                return None;
            }
        };

        let mut names = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => names.push(entry.file_name().to_string_lossy().into_owned()),
                Ok(None) => break,
                Err(e) => {
                    warn!(path = %resolved.display(), error = %e, "dir: failed to read entry");
                    return None;
                }
            }
        }

        names.sort();
        Some(names)
    }

    /// Creates one directory level. Fails if it exists or the parent is
    /// missing.
    pub async fn create_directory(&self, path: &str) -> bool {
        let Some(resolved) = self.resolve_or_log("mkdir", path) else {
            return false;
        };
        match tokio::fs::create_dir(&resolved).await {
            Ok(()) => {
                debug!(path = %resolved.display(), "directory created");
                true
            }
            Err(e) => {
                debug!(path = %resolved.display(), error = %e, "mkdir failed");
                false
            }
        }
    }

    /// Removes an empty directory.
    pub async fn remove_directory(&self, path: &str) -> bool {
        let Some(resolved) = self.resolve_or_log("rmdir", path) else {
            return false;
        };
        if !is_dir(&resolved).await {
            return false;
        }
        match tokio::fs::remove_dir(&resolved).await {
            Ok(()) => {
                debug!(path = %resolved.display(), "directory removed");
                true
            }
            Err(e) => {
                debug!(path = %resolved.display(), error = %e, "rmdir failed");
                false
            }
        }
    }

    /// Removes a regular file.
    pub async fn remove_file(&self, path: &str) -> bool {
        let Some(resolved) = self.resolve_or_log("rm", path) else {
            return false;
        };
        if !is_file(&resolved).await {
            return false;
        }
        match tokio::fs::remove_file(&resolved).await {
            Ok(()) => {
                debug!(path = %resolved.display(), "file removed");
                true
            }
            Err(e) => {
                warn!(path = %resolved.display(), error = %e, "rm failed");
                false
            }
        }
    }

    /// Reads up to one chunk starting at `offset`.
    ///
    /// Returns a short buffer at end-of-file and an empty one exactly at
    /// (or past) it. Errors if the file cannot be opened.
    pub async fn read_chunk(&self, path: &str, offset: u64) -> Result<Vec<u8>, FileServiceError> {
        let resolved = self.resolve(path)?;
        let data = chunk::read_at(&resolved, offset).await?;
        debug!(path = %resolved.display(), offset, len = data.len(), "chunk read");
        Ok(data)
    }

    /// Appends the first `count` bytes of `data` to the file at `path`,
    /// creating it if absent.
    ///
    /// Returns `false` on any I/O failure or if `count` exceeds the buffer;
    /// the file keeps its prior content in that case.
    pub async fn write_chunk(&self, path: &str, data: &[u8], count: usize) -> bool {
        let Some(resolved) = self.resolve_or_log("write", path) else {
            return false;
        };
        if count > data.len() {
            warn!(
                path = %resolved.display(),
                count,
                len = data.len(),
                "write count exceeds buffer"
            );
            return false;
        }

        match chunk::append(&resolved, &data[..count]).await {
            Ok(()) => {
                debug!(path = %resolved.display(), count, "chunk appended");
                true
            }
            Err(e) => {
                warn!(path = %resolved.display(), error = %e, "error writing to file");
                false
            }
        }
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfshare_protocol::CHUNK_SIZE;
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> FileService {
        FileService::new(FileServiceConfig {
            root: dir.path().to_path_buf(),
            confine_paths: false,
        })
    }

    #[test]
    fn resolve_strips_leading_separators() {
        let svc = FileService::new(FileServiceConfig {
            root: PathBuf::from("/srv/share"),
            confine_paths: false,
        });
        assert_eq!(svc.resolve("/").unwrap(), PathBuf::from("/srv/share"));
        assert_eq!(
            svc.resolve("/docs/a.txt").unwrap(),
            PathBuf::from("/srv/share/docs/a.txt")
        );
        assert_eq!(
            svc.resolve("docs/a.txt").unwrap(),
            PathBuf::from("/srv/share/docs/a.txt")
        );
    }

    #[test]
    fn resolve_passes_traversal_without_confinement() {
        let svc = FileService::new(FileServiceConfig {
            root: PathBuf::from("/srv/share"),
            confine_paths: false,
        });
        assert_eq!(
            svc.resolve("../etc").unwrap(),
            PathBuf::from("/srv/share/../etc")
        );
    }

    #[test]
    fn resolve_rejects_traversal_with_confinement() {
        let svc = FileService::new(FileServiceConfig {
            root: PathBuf::from("/srv/share"),
            confine_paths: true,
        });
        assert!(matches!(
            svc.resolve("/../etc/passwd"),
            Err(FileServiceError::InvalidPath(_))
        ));
        assert!(svc.resolve("/docs/a.txt").is_ok());
    }

    #[tokio::test]
    async fn mkdir_then_dir_then_rmdir() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);

        assert!(svc.create_directory("/a").await);
        let listing = svc.list_directory("/").await.unwrap();
        assert!(listing.contains(&"a".to_string()));

        assert!(svc.remove_directory("/a").await);
        let listing = svc.list_directory("/").await.unwrap();
        assert!(!listing.contains(&"a".to_string()));
    }

    #[tokio::test]
    async fn mkdir_fails_when_exists_or_parent_missing() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);

        assert!(svc.create_directory("/a").await);
        assert!(!svc.create_directory("/a").await);
        assert!(!svc.create_directory("/missing/child").await);
    }

    #[tokio::test]
    async fn rmdir_refuses_non_empty_and_files() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);

        std::fs::create_dir(dir.path().join("full")).unwrap();
        std::fs::write(dir.path().join("full/f.txt"), "x").unwrap();
        std::fs::write(dir.path().join("plain.txt"), "x").unwrap();

        assert!(!svc.remove_directory("/full").await);
        assert!(dir.path().join("full/f.txt").exists());
        assert!(!svc.remove_directory("/plain.txt").await);
        assert!(!svc.remove_directory("/nope").await);
    }

    #[tokio::test]
    async fn rm_only_removes_files() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);

        std::fs::create_dir(dir.path().join("d")).unwrap();
        std::fs::write(dir.path().join("f.txt"), "x").unwrap();

        assert!(!svc.remove_file("/d").await);
        assert!(dir.path().join("d").exists());
        assert!(svc.remove_file("/f.txt").await);
        assert!(!dir.path().join("f.txt").exists());
        assert!(!svc.remove_file("/f.txt").await);
    }

    #[tokio::test]
    async fn dir_absent_versus_empty() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);

        std::fs::create_dir(dir.path().join("empty")).unwrap();
        std::fs::write(dir.path().join("file.txt"), "x").unwrap();

        assert_eq!(svc.list_directory("/empty").await, Some(vec![]));
        assert_eq!(svc.list_directory("/missing").await, None);
        assert_eq!(svc.list_directory("/file.txt").await, None);
    }

    #[tokio::test]
    async fn dir_is_sorted() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        for name in ["zeta", "alpha", "mid.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        assert_eq!(
            svc.list_directory("/").await.unwrap(),
            vec!["alpha", "mid.txt", "zeta"]
        );
    }

    #[tokio::test]
    async fn path_valid_rules() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/existing.txt"), "x").unwrap();

        // Target need not exist.
        assert!(svc.path_valid("/new.txt").await);
        assert!(svc.path_valid("/sub/existing.txt").await);
        // Target is a directory.
        assert!(!svc.path_valid("/sub").await);
        assert!(!svc.path_valid("/").await);
        // Parent missing.
        assert!(!svc.path_valid("/nope/new.txt").await);
        // Parent is a file.
        assert!(!svc.path_valid("/sub/existing.txt/child").await);
    }

    #[tokio::test]
    async fn file_exists_and_length() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        std::fs::write(dir.path().join("f.bin"), vec![7u8; 2500]).unwrap();
        std::fs::create_dir(dir.path().join("d")).unwrap();

        assert!(svc.file_exists("/f.bin").await);
        assert!(!svc.file_exists("/d").await);
        assert!(!svc.file_exists("/missing").await);

        assert_eq!(svc.file_length("/f.bin").await, 2500);
        assert_eq!(svc.file_length("/missing").await, 0);
        assert_eq!(svc.file_length("/d").await, 0);
    }

    #[tokio::test]
    async fn metadata_calls_are_idempotent() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        std::fs::write(dir.path().join("f.bin"), b"abc").unwrap();

        for _ in 0..3 {
            assert_eq!(svc.file_length("/f.bin").await, 3);
            assert!(svc.file_exists("/f.bin").await);
            assert!(svc.path_valid("/f.bin").await);
            assert_eq!(svc.list_directory("/").await, Some(vec!["f.bin".to_string()]));
        }
        assert_eq!(std::fs::read(dir.path().join("f.bin")).unwrap(), b"abc");
    }

    #[tokio::test]
    async fn write_chunk_appends_count_bytes() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);

        assert!(svc.write_chunk("/out.bin", b"abcdef", 3).await);
        assert!(svc.write_chunk("/out.bin", b"XYZ", 3).await);
        assert_eq!(std::fs::read(dir.path().join("out.bin")).unwrap(), b"abcXYZ");
    }

    #[tokio::test]
    async fn write_chunk_rejects_overlong_count() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        std::fs::write(dir.path().join("out.bin"), b"keep").unwrap();

        assert!(!svc.write_chunk("/out.bin", b"ab", 5).await);
        assert_eq!(std::fs::read(dir.path().join("out.bin")).unwrap(), b"keep");
    }

    #[tokio::test]
    async fn write_chunk_to_directory_fails() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        std::fs::create_dir(dir.path().join("d")).unwrap();
        assert!(!svc.write_chunk("/d", b"x", 1).await);
    }

    #[tokio::test]
    async fn zero_count_write_creates_empty_file() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        assert!(svc.write_chunk("/empty.bin", &[], 0).await);
        assert!(svc.file_exists("/empty.bin").await);
        assert_eq!(svc.file_length("/empty.bin").await, 0);
    }

    #[tokio::test]
    async fn read_chunk_boundaries() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        let data = vec![1u8; CHUNK_SIZE * 2];
        std::fs::write(dir.path().join("exact.bin"), &data).unwrap();

        assert_eq!(svc.read_chunk("/exact.bin", 0).await.unwrap().len(), CHUNK_SIZE);
        assert_eq!(
            svc.read_chunk("/exact.bin", CHUNK_SIZE as u64)
                .await
                .unwrap()
                .len(),
            CHUNK_SIZE
        );
        assert!(
            svc.read_chunk("/exact.bin", (CHUNK_SIZE * 2) as u64)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(svc.read_chunk("/missing.bin", 0).await.is_err());
    }

    #[tokio::test]
    async fn confined_service_rejects_escape() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("share")).unwrap();
        std::fs::write(dir.path().join("secret.txt"), "s").unwrap();

        let svc = FileService::new(FileServiceConfig {
            root: dir.path().join("share"),
            confine_paths: true,
        });

        assert!(!svc.file_exists("/../secret.txt").await);
        assert_eq!(svc.file_length("/../secret.txt").await, 0);
        assert!(!svc.write_chunk("/../escape.txt", b"x", 1).await);
        assert!(matches!(
            svc.read_chunk("/../secret.txt", 0).await,
            Err(FileServiceError::InvalidPath(_))
        ));
        assert!(!dir.path().join("escape.txt").exists());
    }
}
