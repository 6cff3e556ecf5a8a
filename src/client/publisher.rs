//! Frame publisher
//!
//! Sender side of the ingest protocol: each frame goes out as one start
//! marker followed by payload datagrams of at most `chunk_size` bytes.

use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::error::Result;
use crate::protocol::constants::DEFAULT_CHUNK_SIZE;
use crate::protocol::StartMarker;

/// Publishes encoded frames to one relay ingest port
///
/// # Example
/// ```no_run
/// use frame_relay::client::FramePublisher;
///
/// # async fn example() -> frame_relay::error::Result<()> {
/// let publisher = FramePublisher::connect("127.0.0.1:5000".parse().unwrap()).await?;
///
/// let jpeg = std::fs::read("frame.jpg")?;
/// publisher.send_frame(&jpeg).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FramePublisher {
    socket: UdpSocket,
    chunk_size: usize,
}

impl FramePublisher {
    /// Connect to a relay ingest port using the default chunk size
    pub async fn connect(target: SocketAddr) -> Result<Self> {
        Self::connect_with_chunk_size(target, DEFAULT_CHUNK_SIZE).await
    }

    /// Connect with a custom chunk size
    pub async fn connect_with_chunk_size(target: SocketAddr, chunk_size: usize) -> Result<Self> {
        let local: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(target).await?;

        tracing::debug!(addr = %target, chunk_size = chunk_size, "Publisher connected");

        Ok(Self {
            socket,
            chunk_size: chunk_size.max(1),
        })
    }

    /// Payload bytes per datagram
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Local address of the sending socket
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Send one frame
    ///
    /// Returns the number of datagrams sent, marker included.
    pub async fn send_frame(&self, data: &[u8]) -> Result<usize> {
        let marker = StartMarker::new(data.len())?;
        self.socket.send(&marker.encode()).await?;

        let mut datagrams = 1;
        for chunk in data.chunks(self.chunk_size) {
            self.socket.send(chunk).await?;
            datagrams += 1;
        }

        tracing::trace!(len = data.len(), datagrams = datagrams, "Frame sent");
        Ok(datagrams)
    }
}
