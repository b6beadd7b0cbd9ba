//! TCP server for the rfshare file service.
//!
//! Owns one explicit [`FileService`](rfshare_file_service::FileService)
//! instance, accepts any number of client connections, and answers framed
//! requests in order on each connection. A `shutdown` call from any client
//! stops the listener.

mod dispatch;
mod server;

pub use dispatch::dispatch;
pub use server::{DEFAULT_PORT, FileServer, ServerConfig};

/// Errors produced by the file server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] rfshare_protocol::ProtocolError),

    #[error("server already running")]
    AlreadyRunning,
}
