//! Frame source client
//!
//! Provides the camera side of the ingest protocol, for pushing encoded
//! frames into a relay stream.

pub mod publisher;

pub use publisher::FramePublisher;
