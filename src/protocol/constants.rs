//! Wire protocol constants

/// Literal prefix of every start marker datagram
pub const START_TOKEN: &[u8] = b"START,";

/// Number of decimal digits in the start marker length field
pub const LENGTH_DIGITS: usize = 8;

/// Total size of a start marker datagram (`START,` + 8 digits)
pub const START_MARKER_SIZE: usize = START_TOKEN.len() + LENGTH_DIGITS;

/// Largest length the 8-digit field can declare
pub const MAX_DECLARABLE_LENGTH: usize = 99_999_999;

/// Default maximum payload bytes per datagram
pub const DEFAULT_CHUNK_SIZE: usize = 60_000;

/// Default upper bound on a declared frame length
pub const DEFAULT_MAX_FRAME_SIZE: usize = 500_000;

/// Default deadline for each payload datagram once a frame has started
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 2_000;
