//! TCP client for the rfshare remote file service.
//!
//! [`RemoteClient`] issues one framed call at a time over a single
//! connection and implements [`RemoteFs`](rfshare_transfer::RemoteFs) so a
//! [`TransferController`](rfshare_transfer::TransferController) can drive
//! uploads and downloads through it.

mod client;

pub use client::{ClientConfig, RemoteClient};

/// Errors produced by the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] rfshare_protocol::ProtocolError),

    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error("server error {code}: {message}")]
    Remote { code: i32, message: String },

    #[error("unexpected {got} response to {call}")]
    UnexpectedResponse { call: &'static str, got: &'static str },

    #[error("connection closed")]
    Disconnected,
}
