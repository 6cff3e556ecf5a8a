//! # frame-relay
//!
//! Relays live camera frames from untrusted UDP sources to any number of HTTP
//! viewers.
//!
//! ```text
//!  camera ──UDP──► IngestListener ──► FrameAssembler ──► StreamBuffer
//!                                                            │
//!                 viewer ◄──HTTP multipart── Distributor ◄───┘
//! ```
//!
//! - [`protocol`]: chunked frame transport (start marker + payload datagrams)
//! - [`registry`]: stream registry and bounded per-stream frame buffers
//! - [`distributor`]: per-viewer polling delivery and multipart framing
//! - [`server`]: ingest listeners, HTTP routes, configuration
//! - [`client`]: frame publisher for camera sources
//!
//! ## Example
//!
//! ```no_run
//! use frame_relay::registry::StreamDescriptor;
//! use frame_relay::{RelayConfig, RelayServer};
//!
//! # async fn example() -> frame_relay::error::Result<()> {
//! let config = RelayConfig::default()
//!     .bind("0.0.0.0:8080".parse().unwrap())
//!     .stream(StreamDescriptor::new(0u32, 5000, 5));
//!
//! let server = RelayServer::new(config);
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod distributor;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod stats;

pub use client::FramePublisher;
pub use distributor::{Distributor, FrameSubscription, MultipartEncoder};
pub use error::{Error, Result};
pub use protocol::{AssemblerConfig, FrameAssembler};
pub use registry::{Frame, StreamBuffer, StreamDescriptor, StreamId, StreamRegistry};
pub use server::{RelayConfig, RelayServer};
