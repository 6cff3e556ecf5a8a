//! Bounded per-stream frame buffer
//!
//! Holds the most recent `capacity` frames of one stream. The single writer
//! never waits for readers: when the buffer is full the oldest frame is
//! evicted, which is the only backpressure applied to ingestion.
//!
//! Frames are `Bytes` handles, so the write lock only guards a `VecDeque`
//! push/pop and is never held across I/O.

use std::collections::VecDeque;

use bytes::Bytes;
use tokio::sync::RwLock;

use super::frame::Frame;

#[derive(Debug)]
struct Inner {
    frames: VecDeque<Frame>,
    next_sequence: u64,
}

/// Ring buffer of the latest frames of one stream
#[derive(Debug)]
pub struct StreamBuffer {
    capacity: usize,
    inner: RwLock<Inner>,
}

impl StreamBuffer {
    /// Create a buffer holding at most `capacity` frames (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: RwLock::new(Inner {
                frames: VecDeque::with_capacity(capacity),
                next_sequence: 0,
            }),
        }
    }

    /// Maximum number of buffered frames
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a frame, evicting the oldest if full
    ///
    /// Returns the sequence number assigned to the frame.
    pub async fn push(&self, data: Bytes) -> u64 {
        let mut inner = self.inner.write().await;

        let sequence = inner.next_sequence;
        inner.next_sequence += 1;

        if inner.frames.len() == self.capacity {
            inner.frames.pop_front();
        }
        inner.frames.push_back(Frame::new(sequence, data));

        sequence
    }

    /// Most recently pushed frame, if any
    pub async fn latest(&self) -> Option<Frame> {
        self.inner.read().await.frames.back().cloned()
    }

    /// All buffered frames, oldest first
    pub async fn snapshot(&self) -> Vec<Frame> {
        self.inner.read().await.frames.iter().cloned().collect()
    }

    /// Number of buffered frames
    pub async fn len(&self) -> usize {
        self.inner.read().await.frames.len()
    }

    /// Whether no frame has been buffered yet
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.frames.is_empty()
    }
}
