//! Stream registry and per-stream frame buffers
//!
//! The registry maps each configured stream id to its descriptor, its bounded
//! frame buffer and its ingest statistics. One ingest listener writes each
//! buffer; any number of viewers read it.
//!
//! # Architecture
//!
//! ```text
//!                         Arc<StreamRegistry>
//!                   ┌──────────────────────────────┐
//!                   │ entries: [StreamEntry {      │
//!                   │   descriptor (id,port,cap),  │
//!                   │   buffer: StreamBuffer,      │
//!                   │   stats: IngestStats,        │
//!                   │ }]                           │
//!                   └───────────────┬──────────────┘
//!                                   │
//!         ┌─────────────────────────┼─────────────────────────┐
//!         │                         │                         │
//!         ▼                         ▼                         ▼
//!   [IngestListener]         [FrameSubscription]       [FrameSubscription]
//!   buffer.push()            buffer.latest()           buffer.latest()
//! ```
//!
//! # Zero-Copy Design
//!
//! Frames hold `bytes::Bytes`, so a frame read by many viewers shares one
//! allocation; cloning a frame out of the buffer only bumps a refcount.

pub mod buffer;
pub mod entry;
pub mod error;
pub mod frame;
pub mod store;

pub use buffer::StreamBuffer;
pub use entry::{StreamDescriptor, StreamEntry, StreamInfo};
pub use error::RegistryError;
pub use frame::{Frame, StreamId};
pub use store::StreamRegistry;
