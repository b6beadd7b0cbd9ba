use std::path::{Component, Path};

use crate::FileServiceError;

/// Checks that a root-relative path stays inside the service root.
///
/// Only consulted when confinement is on. The empty path (the root itself)
/// passes.
pub fn validate_relative_path(file_path: &str) -> Result<(), FileServiceError> {
    let reject = |why: &str| Err(FileServiceError::InvalidPath(format!("{why}: {file_path}")));

    // `C:foo` is a plain component on Unix, so check drive letters by hand.
    if file_path.as_bytes().get(1) == Some(&b':') {
        return reject("drive prefix");
    }
    if Path::new(file_path).is_absolute() {
        return reject("absolute path");
    }

    let escapes = Path::new(file_path).components().find_map(|c| match c {
        Component::ParentDir => Some("parent traversal"),
        Component::Prefix(_) => Some("drive prefix"),
        Component::RootDir => Some("absolute path"),
        Component::CurDir | Component::Normal(_) => None,
    });
    match escapes {
        Some(why) => reject(why),
        None => Ok(()),
    }
}
