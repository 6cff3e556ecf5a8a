//! Stream identity and frame types

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Unique identifier for a stream within the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(pub u32);

impl StreamId {
    /// Create a new stream id
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl From<u32> for StreamId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One complete encoded image
///
/// Cheap to clone: the payload is reference counted, so every viewer of a
/// frame shares the same allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Arrival order within the owning buffer, starting at 0
    pub sequence: u64,
    /// Opaque encoded bytes
    pub data: Bytes,
}

impl Frame {
    /// Create a frame
    pub fn new(sequence: u64, data: Bytes) -> Self {
        Self { sequence, data }
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
