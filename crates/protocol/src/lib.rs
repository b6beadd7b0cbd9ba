//! Wire protocol for the rfshare remote filesystem service.
//!
//! Defines the request/response call surface, the length-prefixed JSON
//! framing used on the TCP connection, and the constants shared by the
//! client, server, and transfer crates.

pub mod constants;
pub mod envelope;
pub mod frame;
pub mod messages;

pub use constants::{CHUNK_SIZE, MAX_FRAME_SIZE};
pub use envelope::{RequestFrame, ResponseFrame};
pub use frame::{read_frame, write_frame};
pub use messages::{Request, Response};

/// Errors produced while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("protocol error: {0}")]
    Protocol(String),
}
