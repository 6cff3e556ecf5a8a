//! Start marker codec
//!
//! Every frame on the wire opens with one fixed-size datagram:
//!
//! ```text
//! +---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//! | S | T | A | R | T | , | d | d | d | d | d | d | d | d |
//! +---+---+---+---+---+---+---+---+---+---+---+---+---+---+
//!  \_______ token _______/ \____ total length, zero padded ___/
//! ```
//!
//! The payload datagrams that follow carry exactly the declared number of
//! bytes.

use bytes::{BufMut, Bytes, BytesMut};

use super::constants::{LENGTH_DIGITS, MAX_DECLARABLE_LENGTH, START_MARKER_SIZE, START_TOKEN};
use crate::error::ProtocolError;

/// Decoded start marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartMarker {
    /// Total byte length of the frame that follows
    pub length: usize,
}

impl StartMarker {
    /// Create a marker declaring `length` bytes
    ///
    /// Fails with [`ProtocolError::FrameTooLarge`] if the length does not
    /// fit in the 8-digit field.
    pub fn new(length: usize) -> Result<Self, ProtocolError> {
        if length > MAX_DECLARABLE_LENGTH {
            return Err(ProtocolError::FrameTooLarge {
                declared: length,
                max: MAX_DECLARABLE_LENGTH,
            });
        }
        Ok(Self { length })
    }

    /// Parse a received datagram
    ///
    /// The datagram must be exactly `START,` followed by 8 ASCII digits.
    pub fn parse(datagram: &[u8]) -> Result<Self, ProtocolError> {
        if !is_start_marker(datagram) {
            return Err(ProtocolError::InvalidStart);
        }

        let length = datagram[START_TOKEN.len()..]
            .iter()
            .fold(0usize, |acc, digit| acc * 10 + usize::from(digit - b'0'));

        Ok(Self { length })
    }

    /// Encode to the 14-byte wire form
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(START_MARKER_SIZE);
        buf.put_slice(START_TOKEN);
        buf.put_slice(format!("{:0width$}", self.length, width = LENGTH_DIGITS).as_bytes());
        buf.freeze()
    }
}

/// Check whether a datagram has the exact start marker shape
pub fn is_start_marker(datagram: &[u8]) -> bool {
    datagram.len() == START_MARKER_SIZE
        && datagram.starts_with(START_TOKEN)
        && datagram[START_TOKEN.len()..].iter().all(u8::is_ascii_digit)
}
