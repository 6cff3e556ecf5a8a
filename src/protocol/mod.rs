//! Chunked frame transport protocol
//!
//! A frame larger than one datagram is sent as a fixed-format start marker
//! declaring its total length, followed by payload datagrams of at most
//! `chunk_size` bytes that concatenate to exactly that length.
//!
//! - [`marker`]: start marker parse/encode
//! - [`assembler`]: receiver-side reassembly
//! - [`constants`]: wire constants and defaults

pub mod assembler;
pub mod constants;
pub mod marker;

pub use assembler::{AssemblerConfig, DatagramSource, FrameAssembler};
pub use marker::{is_start_marker, StartMarker};
