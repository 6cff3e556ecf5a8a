//! Registry error types
//!
//! Error types for stream registry operations.

use super::frame::StreamId;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Stream not found
    StreamNotFound(StreamId),
    /// Stream id registered twice
    DuplicateStream(StreamId),
    /// Stream configured with a capacity of zero
    InvalidCapacity(StreamId),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::StreamNotFound(id) => write!(f, "Stream not found: {}", id),
            RegistryError::DuplicateStream(id) => write!(f, "Stream already registered: {}", id),
            RegistryError::InvalidCapacity(id) => {
                write!(f, "Stream {} has zero buffer capacity", id)
            }
        }
    }
}

impl std::error::Error for RegistryError {}
