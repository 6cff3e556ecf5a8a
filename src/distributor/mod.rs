//! Per-viewer frame delivery
//!
//! Each viewer gets its own [`FrameSubscription`], which polls the stream's
//! buffer for the latest frame at a fixed interval. Polling keeps the
//! delivery path fully decoupled from the ingest task: a slow viewer simply
//! skips frames, and the producer never waits on anyone.
//!
//! ```text
//!  StreamBuffer ──latest()──► FrameSubscription ──► MultipartEncoder ──► HTTP body
//!                  (poll)        (skips repeats)
//! ```
//!
//! A frame is delivered once. If the stream then goes quiet, the latest frame
//! is sent again every keepalive interval: many MJPEG clients only render a
//! part once the next boundary arrives.

pub mod multipart;

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, Stream};
use tokio::time::Instant;

use crate::registry::{Frame, RegistryError, StreamEntry, StreamId, StreamRegistry};

pub use multipart::MultipartEncoder;

/// Default delay between two looks at a stream's buffer
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(500);

/// Default delay before re-sending the latest frame of a quiet stream
pub const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(1);

/// Hands out frame subscriptions for registered streams
#[derive(Debug, Clone)]
pub struct Distributor {
    registry: Arc<StreamRegistry>,
    poll_interval: Duration,
    keepalive: Option<Duration>,
}

impl Distributor {
    /// Create a distributor over a registry
    pub fn new(registry: Arc<StreamRegistry>) -> Self {
        Self::with_poll_interval(registry, DEFAULT_POLL_INTERVAL)
    }

    /// Create a distributor with a custom poll interval
    pub fn with_poll_interval(registry: Arc<StreamRegistry>, poll_interval: Duration) -> Self {
        Self {
            registry,
            poll_interval,
            keepalive: Some(DEFAULT_KEEPALIVE),
        }
    }

    /// Set the keepalive re-send interval (None = never re-send)
    pub fn keepalive(mut self, keepalive: Option<Duration>) -> Self {
        self.keepalive = keepalive;
        self
    }

    /// Get the registry
    pub fn registry(&self) -> &Arc<StreamRegistry> {
        &self.registry
    }

    /// Get the poll interval
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Get the keepalive interval
    pub fn keepalive_interval(&self) -> Option<Duration> {
        self.keepalive
    }

    /// Attach a viewer to a stream
    ///
    /// Fails immediately with [`RegistryError::StreamNotFound`] for an
    /// unknown id.
    pub fn subscribe(&self, id: StreamId) -> Result<FrameSubscription, RegistryError> {
        let entry = Arc::clone(self.registry.get(id)?);
        Ok(FrameSubscription::new(
            entry,
            self.poll_interval,
            self.keepalive,
        ))
    }
}

/// One viewer's view of a stream
///
/// Unlike a plain "send `latest()` on every poll" loop, a frame is not
/// re-served on each poll. It is delivered when it is newer than the last
/// delivered one, or again once the keepalive interval has passed without a
/// newer frame. Delivered sequence numbers therefore never decrease.
///
/// Counts as a viewer of the stream until dropped.
#[derive(Debug)]
pub struct FrameSubscription {
    entry: Arc<StreamEntry>,
    poll_interval: Duration,
    keepalive: Option<Duration>,
    last_sequence: Option<u64>,
    last_delivered_at: Option<Instant>,
}

impl FrameSubscription {
    fn new(entry: Arc<StreamEntry>, poll_interval: Duration, keepalive: Option<Duration>) -> Self {
        let viewers = entry.add_viewer();
        tracing::info!(stream = %entry.id(), viewers = viewers, "Viewer attached");

        Self {
            entry,
            poll_interval,
            keepalive,
            last_sequence: None,
            last_delivered_at: None,
        }
    }

    /// Stream this subscription reads from
    pub fn stream_id(&self) -> StreamId {
        self.entry.id()
    }

    /// Latest frame if it is new to this viewer or due for a keepalive
    pub async fn try_next(&mut self) -> Option<Frame> {
        let frame = self.entry.buffer.latest().await?;

        let is_new = self.last_sequence.map_or(true, |seq| frame.sequence > seq);
        let keepalive_due = self
            .keepalive
            .zip(self.last_delivered_at)
            .is_some_and(|(interval, at)| at.elapsed() >= interval);

        if !is_new && !keepalive_due {
            return None;
        }

        self.last_sequence = Some(frame.sequence);
        self.last_delivered_at = Some(Instant::now());
        Some(frame)
    }

    /// Wait for the next frame newer than the last one delivered
    ///
    /// Never returns while the stream is silent.
    pub async fn next_frame(&mut self) -> Frame {
        loop {
            if let Some(frame) = self.try_next().await {
                return frame;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Convert into an endless stream of frames
    pub fn into_stream(self) -> impl Stream<Item = Frame> + Send + 'static {
        stream::unfold(self, |mut sub| async move {
            let frame = sub.next_frame().await;
            Some((frame, sub))
        })
    }
}

impl Drop for FrameSubscription {
    fn drop(&mut self) {
        let viewers = self.entry.remove_viewer();
        tracing::info!(stream = %self.entry.id(), viewers = viewers, "Viewer detached");
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures_util::StreamExt;

    use super::*;
    use crate::registry::StreamDescriptor;

    fn registry() -> Arc<StreamRegistry> {
        let (registry, errors) = StreamRegistry::from_descriptors([
            StreamDescriptor::new(0u32, 0, 3),
            StreamDescriptor::new(1u32, 0, 3),
        ]);
        assert!(errors.is_empty());
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_unknown_stream_fails_fast() {
        let distributor = Distributor::new(registry());

        let err = distributor.subscribe(StreamId(99)).unwrap_err();
        assert_eq!(err, RegistryError::StreamNotFound(StreamId(99)));
    }

    #[tokio::test]
    async fn test_silent_stream_yields_nothing() {
        let distributor = Distributor::new(registry());
        let mut sub = distributor.subscribe(StreamId(0)).unwrap();

        assert!(sub.try_next().await.is_none());

        let waited =
            tokio::time::timeout(Duration::from_millis(20), sub.next_frame()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_delivers_latest_once() {
        let registry = registry();
        let distributor = Distributor::new(Arc::clone(&registry));
        let mut sub = distributor.subscribe(StreamId(0)).unwrap();

        registry.push(StreamId(0), Bytes::from_static(b"A")).await.unwrap();
        registry.push(StreamId(0), Bytes::from_static(b"B")).await.unwrap();

        let frame = sub.next_frame().await;
        assert_eq!(frame.data, Bytes::from_static(b"B"));

        // Same frame is not served twice
        assert!(sub.try_next().await.is_none());

        registry.push(StreamId(0), Bytes::from_static(b"C")).await.unwrap();
        assert_eq!(sub.next_frame().await.data, Bytes::from_static(b"C"));
    }

    #[tokio::test]
    async fn test_keepalive_resends_latest() {
        let registry = registry();
        let distributor = Distributor::new(Arc::clone(&registry))
            .keepalive(Some(Duration::from_millis(20)));
        let mut sub = distributor.subscribe(StreamId(0)).unwrap();

        registry.push(StreamId(0), Bytes::from_static(b"A")).await.unwrap();
        let first = sub.next_frame().await;
        assert!(sub.try_next().await.is_none());

        tokio::time::sleep(Duration::from_millis(30)).await;
        let again = sub.try_next().await.unwrap();
        assert_eq!(again.sequence, first.sequence);
        assert_eq!(again.data, Bytes::from_static(b"A"));

        // Interval restarts after each delivery
        assert!(sub.try_next().await.is_none());
    }

    #[tokio::test]
    async fn test_keepalive_disabled() {
        let registry = registry();
        let distributor = Distributor::new(Arc::clone(&registry)).keepalive(None);
        let mut sub = distributor.subscribe(StreamId(0)).unwrap();

        registry.push(StreamId(0), Bytes::from_static(b"A")).await.unwrap();
        sub.next_frame().await;

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(sub.try_next().await.is_none());
    }

    #[tokio::test]
    async fn test_viewers_are_independent() {
        let registry = registry();
        let distributor = Distributor::new(Arc::clone(&registry));
        let mut first = distributor.subscribe(StreamId(0)).unwrap();
        let mut second = distributor.subscribe(StreamId(0)).unwrap();

        registry.push(StreamId(0), Bytes::from_static(b"A")).await.unwrap();

        assert_eq!(first.next_frame().await.data, Bytes::from_static(b"A"));
        assert_eq!(second.next_frame().await.data, Bytes::from_static(b"A"));
    }

    #[tokio::test]
    async fn test_viewer_count_tracks_subscriptions() {
        let registry = registry();
        let distributor = Distributor::new(Arc::clone(&registry));
        let entry = Arc::clone(registry.get(StreamId(1)).unwrap());

        let first = distributor.subscribe(StreamId(1)).unwrap();
        let second = distributor.subscribe(StreamId(1)).unwrap();
        assert_eq!(entry.viewer_count(), 2);

        drop(first);
        assert_eq!(entry.viewer_count(), 1);
        drop(second);
        assert_eq!(entry.viewer_count(), 0);
    }

    #[tokio::test]
    async fn test_into_stream_in_order() {
        let registry = registry();
        let distributor = Distributor::new(Arc::clone(&registry));
        let mut frames = Box::pin(distributor.subscribe(StreamId(0)).unwrap().into_stream());

        let producer = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                for i in 0..20u8 {
                    registry.push(StreamId(0), Bytes::from(vec![i])).await.unwrap();
                    tokio::time::sleep(Duration::from_millis(2)).await;
                }
            })
        };

        let mut last = None;
        loop {
            let frame = frames.next().await.unwrap();
            if let Some(prev) = last {
                assert!(frame.sequence > prev);
            }
            last = Some(frame.sequence);
            if frame.data[0] == 19 {
                break;
            }
        }

        producer.await.unwrap();
    }
}
