//! Remote file service: filesystem facts and chunk-level I/O.
//!
//! Every call re-reads filesystem metadata and opens file handles anew;
//! the service holds no state beyond its working root. Paths are resolved
//! against that root (see [`FileService::resolve`]).

mod chunk;
mod service;
mod validation;

pub use service::{FileService, FileServiceConfig};
pub use validation::validate_relative_path;

/// Errors produced by the file service.
#[derive(Debug, thiserror::Error)]
pub enum FileServiceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a file: {0}")]
    NotAFile(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}
