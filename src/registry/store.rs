//! Stream registry implementation
//!
//! The registry is populated once at startup and then shared behind an
//! `Arc`. The id → entry map is never mutated afterwards, so lookups take no
//! lock; only the per-stream buffers change.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;

use super::entry::{StreamDescriptor, StreamEntry, StreamInfo};
use super::error::RegistryError;
use super::frame::{Frame, StreamId};

/// Registry of all configured streams
#[derive(Debug, Default)]
pub struct StreamRegistry {
    /// Entries in registration order
    entries: Vec<Arc<StreamEntry>>,

    /// Index into `entries` by stream id
    index: HashMap<StreamId, usize>,
}

impl StreamRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from descriptors, skipping invalid ones
    ///
    /// Returns the registry and the error for every descriptor that was
    /// rejected; a bad entry never prevents the others from registering.
    pub fn from_descriptors<I>(descriptors: I) -> (Self, Vec<RegistryError>)
    where
        I: IntoIterator<Item = StreamDescriptor>,
    {
        let mut registry = Self::new();
        let mut errors = Vec::new();

        for descriptor in descriptors {
            if let Err(e) = registry.register_stream(descriptor) {
                tracing::error!(error = %e, "Stream skipped");
                errors.push(e);
            }
        }

        (registry, errors)
    }

    /// Register a stream
    pub fn register_stream(
        &mut self,
        descriptor: StreamDescriptor,
    ) -> Result<Arc<StreamEntry>, RegistryError> {
        let id = descriptor.id;

        if self.index.contains_key(&id) {
            return Err(RegistryError::DuplicateStream(id));
        }
        if descriptor.capacity == 0 {
            return Err(RegistryError::InvalidCapacity(id));
        }

        tracing::info!(
            stream = %id,
            port = descriptor.port,
            capacity = descriptor.capacity,
            "Stream registered"
        );

        let entry = Arc::new(StreamEntry::new(descriptor));
        self.index.insert(id, self.entries.len());
        self.entries.push(Arc::clone(&entry));

        Ok(entry)
    }

    /// Look up a stream
    pub fn get(&self, id: StreamId) -> Result<&Arc<StreamEntry>, RegistryError> {
        self.index
            .get(&id)
            .map(|&i| &self.entries[i])
            .ok_or(RegistryError::StreamNotFound(id))
    }

    /// Whether a stream id is registered
    pub fn contains(&self, id: StreamId) -> bool {
        self.index.contains_key(&id)
    }

    /// Push a frame into a stream's buffer
    pub async fn push(&self, id: StreamId, data: Bytes) -> Result<u64, RegistryError> {
        let entry = self.get(id)?;
        Ok(entry.buffer.push(data).await)
    }

    /// Most recent frame of a stream
    pub async fn latest(&self, id: StreamId) -> Result<Option<Frame>, RegistryError> {
        let entry = self.get(id)?;
        Ok(entry.buffer.latest().await)
    }

    /// Descriptors of all streams, in registration order
    pub fn list_streams(&self) -> Vec<StreamDescriptor> {
        self.entries.iter().map(|e| e.descriptor.clone()).collect()
    }

    /// Iterate over all entries, in registration order
    pub fn entries(&self) -> impl Iterator<Item = &Arc<StreamEntry>> {
        self.entries.iter()
    }

    /// Listing records for all streams
    pub async fn stream_info(&self) -> Vec<StreamInfo> {
        let mut infos = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            infos.push(entry.info().await);
        }
        infos
    }

    /// Get total number of streams
    pub fn stream_count(&self) -> usize {
        self.entries.len()
    }
}
