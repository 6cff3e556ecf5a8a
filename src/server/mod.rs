//! Relay server
//!
//! - [`listener`]: per-stream UDP ingest loops
//! - [`http`]: viewer-facing routes
//! - [`relay`]: process wiring
//! - [`config`]: configuration and YAML loading

pub mod config;
pub mod http;
pub mod listener;
pub mod relay;

pub use config::{DistributionConfig, IngestConfig, RelayConfig};
pub use listener::{spawn_ingest_listeners, IngestListener};
pub use relay::RelayServer;
