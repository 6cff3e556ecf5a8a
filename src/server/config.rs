//! Relay configuration
//!
//! Loaded once at startup, usually from a YAML file:
//!
//! ```yaml
//! port: 8080
//! source_streams:
//!   - id: 0
//!     port: 5000
//!     queue_size: 5
//! ingest:
//!   read_timeout_ms: 2000
//! ```
//!
//! Every key is optional; missing ones take the defaults below.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::distributor::multipart::{DEFAULT_BOUNDARY, DEFAULT_CONTENT_TYPE};
use crate::distributor::{MultipartEncoder, DEFAULT_KEEPALIVE, DEFAULT_POLL_INTERVAL};
use crate::error::ConfigError;
use crate::protocol::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_FRAME_SIZE, DEFAULT_READ_TIMEOUT_MS, MAX_DECLARABLE_LENGTH,
};
use crate::protocol::AssemblerConfig;
use crate::registry::StreamDescriptor;

/// Largest payload a single IPv4 UDP datagram can carry
pub const MAX_UDP_PAYLOAD: usize = 65_507;

/// Top-level relay configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// HTTP bind address
    pub host: IpAddr,

    /// HTTP port
    pub port: u16,

    /// Streams to ingest
    ///
    /// Entries that do not parse are logged and skipped; the rest load.
    #[serde(deserialize_with = "lenient_streams::deserialize")]
    pub source_streams: Vec<StreamDescriptor>,

    /// Ingest (UDP) settings shared by all streams
    pub ingest: IngestConfig,

    /// Viewer delivery settings
    pub distribution: DistributionConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            source_streams: Vec::new(),
            ingest: IngestConfig::default(),
            distribution: DistributionConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Load and validate a YAML config file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parse and validate YAML config text
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check global limits
    ///
    /// Per-stream problems are reported when the registry is built, so one
    /// bad stream entry does not invalidate the whole file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ingest = &self.ingest;

        if ingest.chunk_size == 0 || ingest.chunk_size > MAX_UDP_PAYLOAD {
            return Err(ConfigError::Invalid(format!(
                "ingest.chunk_size must be between 1 and {}, got {}",
                MAX_UDP_PAYLOAD, ingest.chunk_size
            )));
        }
        if ingest.max_frame_size > MAX_DECLARABLE_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "ingest.max_frame_size must be at most {}, got {}",
                MAX_DECLARABLE_LENGTH, ingest.max_frame_size
            )));
        }
        if ingest.read_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::Invalid(
                "ingest.read_timeout_ms must be positive or null".into(),
            ));
        }
        if self.distribution.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "distribution.poll_interval_us must be positive".into(),
            ));
        }
        if self.distribution.keepalive == Some(Duration::ZERO) {
            return Err(ConfigError::Invalid(
                "distribution.keepalive_ms must be positive or null".into(),
            ));
        }
        if self.distribution.boundary.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "distribution.boundary must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// HTTP listen address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Set the HTTP bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.host = addr.ip();
        self.port = addr.port();
        self
    }

    /// Add a stream
    pub fn stream(mut self, descriptor: StreamDescriptor) -> Self {
        self.source_streams.push(descriptor);
        self
    }

    /// Set the ingest settings
    pub fn ingest(mut self, ingest: IngestConfig) -> Self {
        self.ingest = ingest;
        self
    }

    /// Set the viewer poll interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.distribution.poll_interval = interval;
        self
    }
}

/// UDP ingest settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Address the per-stream UDP sockets bind to
    pub bind_ip: IpAddr,

    /// Maximum payload bytes per datagram
    pub chunk_size: usize,

    /// Largest accepted frame
    pub max_frame_size: usize,

    /// Deadline for each payload datagram (None = wait forever)
    #[serde(rename = "read_timeout_ms", with = "opt_millis")]
    pub read_timeout: Option<Duration>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            read_timeout: Some(Duration::from_millis(DEFAULT_READ_TIMEOUT_MS)),
        }
    }
}

impl IngestConfig {
    /// Set the bind address
    pub fn bind_ip(mut self, ip: IpAddr) -> Self {
        self.bind_ip = ip;
        self
    }

    /// Set the per-payload read deadline
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the chunk size
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Set the maximum frame size
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Reassembly limits for each listener
    pub fn assembler(&self) -> AssemblerConfig {
        AssemblerConfig::default()
            .chunk_size(self.chunk_size)
            .max_frame_size(self.max_frame_size)
            .read_timeout(self.read_timeout)
    }
}

/// Viewer delivery settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// Delay between two looks at a stream buffer
    #[serde(rename = "poll_interval_us", with = "micros")]
    pub poll_interval: Duration,

    /// Re-send the latest frame of a quiet stream this often (None = never)
    #[serde(rename = "keepalive_ms", with = "opt_millis")]
    pub keepalive: Option<Duration>,

    /// Multipart boundary
    pub boundary: String,

    /// Content type of each part
    pub content_type: String,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            keepalive: Some(DEFAULT_KEEPALIVE),
            boundary: DEFAULT_BOUNDARY.to_string(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}

impl DistributionConfig {
    /// Part encoder for these settings
    pub fn encoder(&self) -> MultipartEncoder {
        MultipartEncoder::new(self.boundary.clone(), self.content_type.clone())
    }
}

mod lenient_streams {
    use serde::{Deserialize, Deserializer};

    use crate::registry::StreamDescriptor;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<StreamDescriptor>, D::Error> {
        let entries = Option::<Vec<serde_yaml::Value>>::deserialize(d)?.unwrap_or_default();

        Ok(entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_yaml::from_value(entry) {
                Ok(descriptor) => Some(descriptor),
                Err(e) => {
                    tracing::error!(index = index, error = %e, "Stream skipped");
                    None
                }
            })
            .collect())
    }
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

mod micros {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_micros(u64::deserialize(d)?))
    }
}
