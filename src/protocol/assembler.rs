//! Frame reassembly
//!
//! Turns the datagrams of one logical frame back into a single contiguous
//! buffer. The protocol carries no sequence numbers or acknowledgements, so
//! an attempt is a two-state machine:
//!
//! ```text
//!              start marker            payload == declared length
//! AwaitingStart ───────────► Accumulating ───────────────────────► Frame
//!       │                         │
//!       └──── InvalidStart        ├──── UnexpectedStart / PayloadOverflow
//!             FrameTooLarge       └──── Transport (incl. read deadline)
//! ```
//!
//! A failed attempt drops its state; the caller simply starts the next one.

use std::future::Future;
use std::io;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::net::UdpSocket;

use super::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_FRAME_SIZE, DEFAULT_READ_TIMEOUT_MS, START_MARKER_SIZE,
};
use super::marker::{is_start_marker, StartMarker};
use crate::error::{AssemblyError, ProtocolError};

/// Source of whole datagrams
///
/// Each call yields exactly one datagram. If the datagram is larger than
/// `buf`, the excess is discarded and `buf.len()` is returned, matching UDP
/// receive semantics.
pub trait DatagramSource {
    fn recv_datagram(&mut self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;
}

impl DatagramSource for UdpSocket {
    async fn recv_datagram(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let (len, _peer) = self.recv_from(buf).await?;
        Ok(len)
    }
}

/// Reassembly limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Maximum payload bytes in one datagram
    pub chunk_size: usize,
    /// Largest declared frame length accepted
    pub max_frame_size: usize,
    /// Deadline for each payload datagram (None = wait forever)
    pub read_timeout: Option<Duration>,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            read_timeout: Some(Duration::from_millis(DEFAULT_READ_TIMEOUT_MS)),
        }
    }
}

impl AssemblerConfig {
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

    /// Set the per-payload read deadline
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }
}

/// State of one reassembly attempt
#[derive(Debug)]
struct AssemblyState {
    declared: usize,
    buf: BytesMut,
}

impl AssemblyState {
    fn new(declared: usize) -> Self {
        Self {
            declared,
            buf: BytesMut::with_capacity(declared),
        }
    }

    fn received(&self) -> usize {
        self.buf.len()
    }

    fn remaining(&self) -> usize {
        self.declared - self.received()
    }

    fn is_complete(&self) -> bool {
        self.received() == self.declared
    }

    fn append(&mut self, chunk: &[u8]) {
        self.buf.put_slice(chunk);
    }

    fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Reassembles chunked frames from a [`DatagramSource`]
#[derive(Debug)]
pub struct FrameAssembler {
    config: AssemblerConfig,
    /// Receive buffer, one byte larger than any acceptable datagram so
    /// oversized datagrams are detected instead of truncated
    scratch: Vec<u8>,
}

impl FrameAssembler {
    /// Create an assembler with the given limits
    pub fn new(config: AssemblerConfig) -> Self {
        let scratch = vec![0u8; config.chunk_size.max(START_MARKER_SIZE) + 1];
        Self { config, scratch }
    }

    /// Get the assembler limits
    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Read one complete frame
    ///
    /// On a malformed start marker or an oversized declaration no payload
    /// datagram is consumed. Reassembly accepts any split of the payload into
    /// datagrams of at most `chunk_size` bytes.
    pub async fn assemble_one<S: DatagramSource>(
        &mut self,
        source: &mut S,
    ) -> Result<Bytes, AssemblyError> {
        let len = source
            .recv_datagram(&mut self.scratch[..START_MARKER_SIZE + 1])
            .await?;
        let marker = StartMarker::parse(&self.scratch[..len])?;

        if marker.length > self.config.max_frame_size {
            return Err(ProtocolError::FrameTooLarge {
                declared: marker.length,
                max: self.config.max_frame_size,
            }
            .into());
        }

        let mut state = AssemblyState::new(marker.length);

        while !state.is_complete() {
            let len = self.recv_payload(source, &state).await?;
            let datagram = &self.scratch[..len];

            if is_start_marker(datagram) {
                return Err(ProtocolError::UnexpectedStart.into());
            }

            let allowed = state.remaining().min(self.config.chunk_size);
            if len > allowed {
                return Err(ProtocolError::PayloadOverflow {
                    expected: allowed,
                    received: len,
                }
                .into());
            }

            state.append(datagram);
        }

        Ok(state.finish())
    }

    async fn recv_payload<S: DatagramSource>(
        &mut self,
        source: &mut S,
        state: &AssemblyState,
    ) -> io::Result<usize> {
        let Self { config, scratch } = self;

        let Some(deadline) = config.read_timeout else {
            return source.recv_datagram(scratch).await;
        };

        match tokio::time::timeout(deadline, source.recv_datagram(scratch)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!(
                    "payload stalled after {} of {} bytes",
                    state.received(),
                    state.declared
                ),
            )),
        }
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new(AssemblerConfig::default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use tokio_test::assert_err;

    use super::*;

    /// Scripted datagram source; pends forever once the script runs out
    pub(crate) struct ScriptedSource {
        datagrams: VecDeque<io::Result<Vec<u8>>>,
    }

    impl ScriptedSource {
        pub(crate) fn new<I, D>(datagrams: I) -> Self
        where
            I: IntoIterator<Item = D>,
            D: Into<Vec<u8>>,
        {
            Self {
                datagrams: datagrams.into_iter().map(|d| Ok(d.into())).collect(),
            }
        }

        pub(crate) fn push_err(&mut self, kind: io::ErrorKind) {
            self.datagrams.push_back(Err(io::Error::from(kind)));
        }

        pub(crate) fn remaining(&self) -> usize {
            self.datagrams.len()
        }
    }

    impl DatagramSource for ScriptedSource {
        async fn recv_datagram(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.datagrams.pop_front() {
                Some(Ok(datagram)) => {
                    let len = datagram.len().min(buf.len());
                    buf[..len].copy_from_slice(&datagram[..len]);
                    Ok(len)
                }
                Some(Err(e)) => Err(e),
                None => std::future::pending().await,
            }
        }
    }

    fn marker(len: usize) -> Vec<u8> {
        StartMarker::new(len).unwrap().encode().to_vec()
    }

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn small_config(chunk_size: usize) -> AssemblerConfig {
        AssemblerConfig::default()
            .chunk_size(chunk_size)
            .read_timeout(Some(Duration::from_millis(50)))
    }

    fn protocol_error(result: Result<Bytes, AssemblyError>) -> ProtocolError {
        match result {
            Err(AssemblyError::Protocol(e)) => e,
            other => panic!("expected protocol error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_single_chunk_frame() {
        let data = b"0123456789".to_vec();
        let mut source = ScriptedSource::new([b"START,00000010".to_vec(), data.clone()]);
        let mut assembler = FrameAssembler::default();

        let frame = assembler.assemble_one(&mut source).await.unwrap();
        assert_eq!(frame.len(), 10);
        assert_eq!(&frame[..], &data[..]);
    }

    #[tokio::test]
    async fn test_empty_frame() {
        let mut source = ScriptedSource::new([b"START,00000000".to_vec()]);
        let mut assembler = FrameAssembler::default();

        let frame = assembler.assemble_one(&mut source).await.unwrap();
        assert!(frame.is_empty());
    }

    #[tokio::test]
    async fn test_split_points_do_not_matter() {
        let data = payload(130);
        let splits: &[&[usize]] = &[&[100, 30], &[50, 47, 33], &[1, 99, 30], &[130]];

        for split in splits {
            let mut datagrams = vec![marker(130)];
            let mut offset = 0;
            for len in split.iter() {
                datagrams.push(data[offset..offset + len].to_vec());
                offset += len;
            }

            let mut source = ScriptedSource::new(datagrams);
            let mut assembler = FrameAssembler::new(small_config(130));

            let frame = assembler.assemble_one(&mut source).await.unwrap();
            assert_eq!(&frame[..], &data[..], "split {:?}", split);
        }
    }

    #[tokio::test]
    async fn test_reassembly_across_sizes() {
        for chunk_size in [1usize, 7, 64, 1000] {
            for len in [0usize, 1, chunk_size - 1, chunk_size, chunk_size + 1, 3 * chunk_size + 5] {
                let data = payload(len);
                let mut datagrams = vec![marker(len)];
                datagrams.extend(data.chunks(chunk_size).map(<[u8]>::to_vec));

                let mut source = ScriptedSource::new(datagrams);
                let mut assembler = FrameAssembler::new(small_config(chunk_size));

                let frame = assembler.assemble_one(&mut source).await.unwrap();
                assert_eq!(frame.len(), len);
                assert_eq!(&frame[..], &data[..]);
                assert_eq!(source.remaining(), 0);
            }
        }
    }

    #[tokio::test]
    async fn test_frame_at_max_size() {
        let data = payload(200);
        let mut datagrams = vec![marker(200)];
        datagrams.extend(data.chunks(64).map(<[u8]>::to_vec));

        let config = small_config(64).max_frame_size(200);
        let mut source = ScriptedSource::new(datagrams);
        let mut assembler = FrameAssembler::new(config);

        let frame = assembler.assemble_one(&mut source).await.unwrap();
        assert_eq!(frame.len(), 200);
    }

    #[tokio::test]
    async fn test_invalid_start_consumes_no_payload() {
        let bad_markers: Vec<Vec<u8>> = vec![
            b"START,0000010".to_vec(),
            b"START,000000100".to_vec(),
            b"BEGIN,00000010".to_vec(),
            b"START,0000001x".to_vec(),
            payload(60_000),
        ];

        for bad in bad_markers {
            let mut source = ScriptedSource::new([bad, payload(10)]);
            let mut assembler = FrameAssembler::default();

            let err = protocol_error(assembler.assemble_one(&mut source).await);
            assert_eq!(err, ProtocolError::InvalidStart);
            assert_eq!(source.remaining(), 1);
        }
    }

    #[tokio::test]
    async fn test_frame_too_large_reads_no_payload() {
        let config = AssemblerConfig::default().max_frame_size(1000);
        let mut source = ScriptedSource::new([marker(1001), payload(1001)]);
        let mut assembler = FrameAssembler::new(config);

        let err = protocol_error(assembler.assemble_one(&mut source).await);
        assert_eq!(
            err,
            ProtocolError::FrameTooLarge {
                declared: 1001,
                max: 1000
            }
        );
        assert_eq!(source.remaining(), 1);
    }

    #[tokio::test]
    async fn test_unexpected_start_mid_frame() {
        let mut source = ScriptedSource::new([marker(100), payload(40), marker(10), payload(10)]);
        let mut assembler = FrameAssembler::new(small_config(64));

        let err = protocol_error(assembler.assemble_one(&mut source).await);
        assert_eq!(err, ProtocolError::UnexpectedStart);

        // The interrupting frame is lost; the next attempt sees its payload
        let err = protocol_error(assembler.assemble_one(&mut source).await);
        assert_eq!(err, ProtocolError::InvalidStart);
    }

    #[tokio::test]
    async fn test_payload_overflow() {
        // Datagram longer than the remaining declared length
        let mut source = ScriptedSource::new([marker(10), payload(12)]);
        let mut assembler = FrameAssembler::new(small_config(64));

        let err = protocol_error(assembler.assemble_one(&mut source).await);
        assert_eq!(
            err,
            ProtocolError::PayloadOverflow {
                expected: 10,
                received: 12
            }
        );

        // Datagram longer than the chunk size
        let mut source = ScriptedSource::new([marker(100), payload(65)]);
        let err = protocol_error(assembler.assemble_one(&mut source).await);
        assert_eq!(
            err,
            ProtocolError::PayloadOverflow {
                expected: 64,
                received: 65
            }
        );
    }

    #[tokio::test]
    async fn test_transport_error_is_not_protocol_error() {
        let mut source = ScriptedSource::new([marker(10)]);
        source.push_err(io::ErrorKind::ConnectionReset);
        let mut assembler = FrameAssembler::default();

        let result = assembler.assemble_one(&mut source).await;
        match assert_err!(result) {
            AssemblyError::Transport(e) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stalled_payload_times_out() {
        let mut source = ScriptedSource::new([marker(100), payload(40)]);
        let mut assembler = FrameAssembler::new(small_config(64));

        let err = assert_err!(assembler.assemble_one(&mut source).await);
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_recovers_after_failed_attempt() {
        let data = payload(20);
        let mut source = ScriptedSource::new([
            b"garbage".to_vec(),
            marker(20),
            data[..10].to_vec(),
            data[10..].to_vec(),
        ]);
        let mut assembler = FrameAssembler::new(small_config(64));

        assert_err!(assembler.assemble_one(&mut source).await);
        let frame = assembler.assemble_one(&mut source).await.unwrap();
        assert_eq!(&frame[..], &data[..]);
    }
}
