use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::session::{Direction, TransferSession};

/// Callback invoked with transfer progress.
pub type ProgressCallback = Box<dyn Fn(&TransferProgress) + Send + Sync>;

/// A progress snapshot, emitted once after the resume decision and once
/// after every applied chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferProgress {
    pub direction: Direction,
    /// Bytes present at the destination, including any resumed prefix.
    pub transferred: u64,
    pub total: u64,
    /// Prefix length taken over from a previous partial transfer.
    pub resumed_from: u64,
    /// Throughput over the recent window; 0.0 until two samples exist.
    pub bytes_per_second: f64,
}

impl TransferProgress {
    pub(crate) fn snapshot(session: &TransferSession, bytes_per_second: f64) -> Self {
        Self {
            direction: session.direction(),
            transferred: session.transferred(),
            total: session.source_size(),
            resumed_from: session.resumed_from(),
            bytes_per_second,
        }
    }

    /// True for the first report of a session that resumed a partial file.
    pub fn is_resume_start(&self) -> bool {
        self.resumed_from > 0 && self.transferred == self.resumed_from
    }

    /// Completion ratio in `[0.0, 1.0]`; an empty source counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.transferred as f64 / self.total as f64
    }
}

// ---------------------------------------------------------------------------
// SpeedCalculator
// ---------------------------------------------------------------------------

/// Throughput over a sliding time window.
///
/// Samples older than the window, or beyond `capacity`, are evicted on
/// every [`record`](Self::record).
pub struct SpeedCalculator {
    window: Duration,
    capacity: usize,
    samples: VecDeque<(Instant, u64)>,
    window_bytes: u64,
}

impl SpeedCalculator {
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            window,
            capacity: capacity.max(2),
            samples: VecDeque::new(),
            window_bytes: 0,
        }
    }

    /// Records `bytes` applied at the current instant.
    pub fn record(&mut self, bytes: u64) {
        let now = Instant::now();
        self.samples.push_back((now, bytes));
        self.window_bytes += bytes;

        while let Some(&(at, old)) = self.samples.front() {
            let stale = now.duration_since(at) > self.window;
            if !stale && self.samples.len() <= self.capacity {
                break;
            }
            self.samples.pop_front();
            self.window_bytes -= old;
        }
    }

    /// Bytes per second across the retained samples; 0.0 until two samples
    /// some time apart exist.
    pub fn bytes_per_second(&self) -> f64 {
        let (Some(&(first, _)), Some(&(last, _))) = (self.samples.front(), self.samples.back())
        else {
            return 0.0;
        };
        let elapsed = last.duration_since(first).as_secs_f64();
        if self.samples.len() < 2 || elapsed == 0.0 {
            return 0.0;
        }
        self.window_bytes as f64 / elapsed
    }
}

impl Default for SpeedCalculator {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), 64)
    }
}
