//! Ingest listener
//!
//! One listener per configured stream: binds the stream's UDP port and runs
//! the reassembly loop for the life of the process, pushing every completed
//! frame into the stream's buffer.
//!
//! Every failure after bind is per frame: the attempt is dropped, logged,
//! and the loop continues with the next start marker.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

use crate::error::{AssemblyError, Result};
use crate::protocol::{AssemblerConfig, FrameAssembler};
use crate::registry::{StreamEntry, StreamRegistry};
use crate::server::config::IngestConfig;

/// Pause after a socket error before reading again
pub const TRANSPORT_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// Delay before the next attempt after a failed one
///
/// Only socket errors back off; protocol errors and read deadlines go
/// straight back to waiting for a start marker.
fn backoff_after(err: &AssemblyError) -> Option<Duration> {
    match err {
        AssemblyError::Transport(_) if !err.is_timeout() => Some(TRANSPORT_ERROR_BACKOFF),
        _ => None,
    }
}

/// UDP ingest loop for one stream
pub struct IngestListener {
    entry: Arc<StreamEntry>,
    socket: UdpSocket,
    assembler: FrameAssembler,
}

impl IngestListener {
    /// Bind the stream's UDP port
    pub async fn bind(entry: Arc<StreamEntry>, config: &IngestConfig) -> Result<Self> {
        let addr = SocketAddr::new(config.bind_ip, entry.descriptor.port);
        let socket = UdpSocket::bind(addr).await?;

        Ok(Self::from_socket(entry, socket, config.assembler()))
    }

    /// Use an already bound socket
    pub fn from_socket(entry: Arc<StreamEntry>, socket: UdpSocket, config: AssemblerConfig) -> Self {
        Self {
            entry,
            socket,
            assembler: FrameAssembler::new(config),
        }
    }

    /// Local address of the ingest socket
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Run the ingest loop
    ///
    /// Never returns; abort the task to stop it.
    pub async fn run(mut self) {
        let id = self.entry.id();
        tracing::info!(
            stream = %id,
            addr = ?self.socket.local_addr().ok(),
            "Ingest listener started"
        );

        loop {
            match self.assembler.assemble_one(&mut self.socket).await {
                Ok(data) => {
                    let len = data.len();
                    let sequence = self.entry.buffer.push(data).await;
                    self.entry.stats.record_frame(len);

                    tracing::debug!(stream = %id, sequence = sequence, len = len, "Frame received");
                }
                Err(e) => {
                    self.entry.stats.record_error(&e);

                    match e {
                        AssemblyError::Protocol(_) => {
                            tracing::warn!(stream = %id, error = %e, "Frame dropped");
                        }
                        AssemblyError::Transport(_) if e.is_timeout() => {
                            tracing::warn!(stream = %id, error = %e, "Sender stalled, frame dropped");
                        }
                        AssemblyError::Transport(_) => {
                            tracing::debug!(stream = %id, error = %e, "Socket error");
                        }
                    }

                    if let Some(delay) = backoff_after(&e) {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}

/// Spawn one ingest task per registered stream
///
/// A stream whose port cannot be bound logs the failure and its task ends;
/// the other streams are unaffected.
pub fn spawn_ingest_listeners(
    registry: &Arc<StreamRegistry>,
    config: &IngestConfig,
) -> Vec<JoinHandle<()>> {
    registry
        .entries()
        .map(|entry| {
            let entry = Arc::clone(entry);
            let config = config.clone();

            tokio::spawn(async move {
                let id = entry.id();
                let port = entry.descriptor.port;

                match IngestListener::bind(entry, &config).await {
                    Ok(listener) => listener.run().await,
                    Err(e) => {
                        tracing::error!(stream = %id, port = port, error = %e, "Failed to bind ingest socket");
                    }
                }
            })
        })
        .collect()
}
