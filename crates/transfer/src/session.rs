use std::fmt;

use crate::TransferError;

/// Which way the bytes flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upload,
    Download,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Upload => f.write_str("upload"),
            Direction::Download => f.write_str("download"),
        }
    }
}

/// Progress counter for a single upload or download.
///
/// Lives only for the duration of one transfer call. Chunks are applied in
/// strictly increasing offset order, each at the current
/// [`transferred`](Self::transferred) offset, and the counter can never
/// pass the source size.
#[derive(Debug, Clone)]
pub struct TransferSession {
    direction: Direction,
    source_size: u64,
    transferred_bytes: u64,
    resumed_from: u64,
    chunk_size: usize,
}

impl TransferSession {
    /// Starts a session at `resume_from` (0 for a fresh transfer).
    pub fn new(
        direction: Direction,
        source_size: u64,
        resume_from: u64,
        chunk_size: usize,
    ) -> Result<Self, TransferError> {
        if chunk_size == 0 {
            return Err(TransferError::Session("chunk size must be non-zero".into()));
        }
        if resume_from > source_size {
            return Err(TransferError::Session(format!(
                "resume offset {resume_from} exceeds source size {source_size}"
            )));
        }
        Ok(Self {
            direction,
            source_size,
            transferred_bytes: resume_from,
            resumed_from: resume_from,
            chunk_size,
        })
    }

    /// Records `bytes` confirmed at the destination.
    pub fn advance(&mut self, bytes: u64) -> Result<(), TransferError> {
        let next = self.transferred_bytes.saturating_add(bytes);
        if next > self.source_size {
            return Err(TransferError::Session(format!(
                "advancing by {bytes} would pass source size {} (at {})",
                self.source_size, self.transferred_bytes
            )));
        }
        self.transferred_bytes = next;
        Ok(())
    }

    /// Size of the next chunk: a full chunk, or the remainder at the tail.
    pub fn next_chunk_len(&self) -> usize {
        let remaining = self.remaining();
        if remaining < self.chunk_size as u64 {
            remaining as usize
        } else {
            self.chunk_size
        }
    }

    pub fn is_complete(&self) -> bool {
        self.transferred_bytes == self.source_size
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn source_size(&self) -> u64 {
        self.source_size
    }

    /// Bytes confirmed at the destination, including any resumed prefix.
    pub fn transferred(&self) -> u64 {
        self.transferred_bytes
    }

    /// Offset the session started from (the trusted destination prefix).
    pub fn resumed_from(&self) -> u64 {
        self.resumed_from
    }

    pub fn remaining(&self) -> u64 {
        self.source_size - self.transferred_bytes
    }
}
