//! Ingest statistics

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::AssemblyError;

/// Lock-free counters for one stream's ingest loop
///
/// Written only by the stream's listener, read by anyone.
#[derive(Debug)]
pub struct IngestStats {
    started_at: Instant,
    frames_received: AtomicU64,
    bytes_received: AtomicU64,
    protocol_errors: AtomicU64,
    transport_errors: AtomicU64,
    timeouts: AtomicU64,
}

impl IngestStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            frames_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
            transport_errors: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
        }
    }

    /// Record a completed frame
    pub fn record_frame(&self, len: usize) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(len as u64, Ordering::Relaxed);
    }

    /// Record a dropped reassembly attempt
    pub fn record_error(&self, err: &AssemblyError) {
        let counter = match err {
            AssemblyError::Protocol(_) => &self.protocol_errors,
            AssemblyError::Transport(_) if err.is_timeout() => &self.timeouts,
            AssemblyError::Transport(_) => &self.transport_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Time since the stats were created
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> IngestStatsSnapshot {
        let frames_received = self.frames_received.load(Ordering::Relaxed);
        let bytes_received = self.bytes_received.load(Ordering::Relaxed);
        let secs = self.duration().as_secs_f64();

        let (framerate, bitrate) = if secs > 0.0 {
            (
                frames_received as f64 / secs,
                ((bytes_received * 8) as f64 / secs) as u64,
            )
        } else {
            (0.0, 0)
        };

        IngestStatsSnapshot {
            frames_received,
            bytes_received,
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            framerate,
            bitrate,
        }
    }
}

impl Default for IngestStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable view of [`IngestStats`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestStatsSnapshot {
    /// Frames reassembled and buffered
    pub frames_received: u64,
    /// Payload bytes of those frames
    pub bytes_received: u64,
    /// Attempts dropped for malformed input
    pub protocol_errors: u64,
    /// Attempts dropped for socket failures
    pub transport_errors: u64,
    /// Attempts dropped because the sender stalled mid-frame
    pub timeouts: u64,
    /// Average frames per second since start
    pub framerate: f64,
    /// Average bits per second since start
    pub bitrate: u64,
}
