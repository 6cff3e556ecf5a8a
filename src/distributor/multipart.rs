//! `multipart/x-mixed-replace` part framing
//!
//! Browsers render an MJPEG stream by replacing the displayed image with
//! each new body part:
//!
//! ```text
//! --frame\r\n
//! Content-Type: image/jpeg\r\n
//! Content-Length: 48213\r\n
//! \r\n
//! <jpeg bytes>\r\n
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::registry::Frame;

/// Default part boundary
pub const DEFAULT_BOUNDARY: &str = "frame";

/// Default content type of each part
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Wraps frames as multipart body parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartEncoder {
    boundary: String,
    content_type: String,
}

impl MultipartEncoder {
    /// Create an encoder with a custom boundary and part content type
    pub fn new(boundary: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            content_type: content_type.into(),
        }
    }

    /// Part boundary
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the response `Content-Type` header
    pub fn response_content_type(&self) -> String {
        format!("multipart/x-mixed-replace; boundary={}", self.boundary)
    }

    /// Encode one frame as a body part
    pub fn encode(&self, frame: &Frame) -> Bytes {
        let header = format!(
            "--{}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
            self.boundary,
            self.content_type,
            frame.len()
        );

        let mut buf = BytesMut::with_capacity(header.len() + frame.len() + 2);
        buf.put_slice(header.as_bytes());
        buf.put_slice(&frame.data);
        buf.put_slice(b"\r\n");
        buf.freeze()
    }
}

impl Default for MultipartEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_BOUNDARY, DEFAULT_CONTENT_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_content_type() {
        let encoder = MultipartEncoder::default();
        assert_eq!(
            encoder.response_content_type(),
            "multipart/x-mixed-replace; boundary=frame"
        );
    }

    #[test]
    fn test_encode_part() {
        let encoder = MultipartEncoder::default();
        let frame = Frame::new(0, Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xD9]));

        let part = encoder.encode(&frame);
        let mut expected =
            b"--frame\r\nContent-Type: image/jpeg\r\nContent-Length: 4\r\n\r\n".to_vec();
        expected.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xD9]);
        expected.extend_from_slice(b"\r\n");

        assert_eq!(&part[..], &expected[..]);
    }

    #[test]
    fn test_custom_boundary() {
        let encoder = MultipartEncoder::new("cam", "image/png");
        let part = encoder.encode(&Frame::new(3, Bytes::from_static(b"png")));

        assert!(part.starts_with(b"--cam\r\nContent-Type: image/png\r\n"));
        assert!(part.ends_with(b"png\r\n"));
        assert_eq!(encoder.boundary(), "cam");
    }
}
