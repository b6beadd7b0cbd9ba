//! Length-prefixed JSON framing.
//!
//! # Wire format
//!
//! ```text
//! FRAME:
//!   [4 bytes BE: body_len]
//!   [body_len bytes: JSON-encoded RequestFrame or ResponseFrame]
//! ```
//!
//! A stream that ends cleanly between frames signals a disconnect.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::ProtocolError;
use crate::constants::MAX_FRAME_SIZE;

/// Encodes `frame` as JSON and writes it with its length prefix.
///
/// The writer is flushed so a buffered stream delivers the frame at once.
pub async fn write_frame<W, T>(writer: &mut W, frame: &T) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let body = serde_json::to_vec(frame)?;
    if body.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size: body.len(),
            max: MAX_FRAME_SIZE,
        });
    }

    writer.write_u32(body.len() as u32).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one frame from the stream.
///
/// Returns `None` if the stream ended before the first byte of a frame.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, ProtocolError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    let n = reader.read(&mut len_buf).await?;
    if n == 0 {
        return Ok(None);
    }
    if n < len_buf.len() {
        reader.read_exact(&mut len_buf[n..]).await?;
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size: len,
            max: MAX_FRAME_SIZE,
        });
    }
    if len == 0 {
        return Err(ProtocolError::Protocol("empty frame body".into()));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(serde_json::from_slice(&body)?))
}
