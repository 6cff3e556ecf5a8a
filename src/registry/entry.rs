//! Stream descriptor and entry types
//!
//! This module defines the per-stream state stored in the registry.

use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::stats::{IngestStats, IngestStatsSnapshot};

use super::buffer::StreamBuffer;
use super::frame::StreamId;

/// Static description of one configured stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Stream identifier, unique within the registry
    pub id: StreamId,
    /// UDP port the stream's frames arrive on
    pub port: u16,
    /// Maximum number of buffered frames
    #[serde(alias = "queue_size")]
    pub capacity: usize,
}

impl StreamDescriptor {
    /// Create a new descriptor
    pub fn new(id: impl Into<StreamId>, port: u16, capacity: usize) -> Self {
        Self {
            id: id.into(),
            port,
            capacity,
        }
    }
}

/// Entry for a single stream in the registry
#[derive(Debug)]
pub struct StreamEntry {
    /// Immutable stream description
    pub descriptor: StreamDescriptor,

    /// Most recent frames
    pub buffer: StreamBuffer,

    /// Ingest counters
    pub stats: IngestStats,

    /// Number of attached viewers
    viewer_count: AtomicU32,
}

impl StreamEntry {
    /// Create a new stream entry
    pub(super) fn new(descriptor: StreamDescriptor) -> Self {
        let buffer = StreamBuffer::new(descriptor.capacity);

        Self {
            descriptor,
            buffer,
            stats: IngestStats::new(),
            viewer_count: AtomicU32::new(0),
        }
    }

    /// Stream identifier
    pub fn id(&self) -> StreamId {
        self.descriptor.id
    }

    /// Get the number of viewers
    pub fn viewer_count(&self) -> u32 {
        self.viewer_count.load(Ordering::Relaxed)
    }

    pub(crate) fn add_viewer(&self) -> u32 {
        self.viewer_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn remove_viewer(&self) -> u32 {
        self.viewer_count
            .fetch_sub(1, Ordering::Relaxed)
            .saturating_sub(1)
    }

    /// Listing record for this stream
    pub async fn info(&self) -> StreamInfo {
        StreamInfo {
            id: self.descriptor.id,
            port: self.descriptor.port,
            capacity: self.descriptor.capacity,
            buffered: self.buffer.len().await,
            viewers: self.viewer_count(),
            ingest: self.stats.snapshot(),
        }
    }
}

/// Listing record for a stream
#[derive(Debug, Clone, Serialize)]
pub struct StreamInfo {
    /// Stream identifier
    pub id: StreamId,
    /// Ingest port
    pub port: u16,
    /// Buffer capacity
    pub capacity: usize,
    /// Frames currently buffered
    pub buffered: usize,
    /// Attached viewers
    pub viewers: u32,
    /// Ingest counters
    pub ingest: IngestStatsSnapshot,
}
