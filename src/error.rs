//! Error types
//!
//! Protocol, assembly and configuration errors, plus the crate-level
//! [`Error`] that wraps every failure a public operation can return.

use std::fmt;
use std::io;

use crate::registry::RegistryError;

/// Malformed or desynchronized ingest input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// First datagram of an attempt is not a well-formed start marker
    InvalidStart,
    /// Declared frame length exceeds the configured maximum
    FrameTooLarge { declared: usize, max: usize },
    /// A start marker arrived while payload was still expected
    UnexpectedStart,
    /// A payload datagram exceeds the chunk size or the declared length
    PayloadOverflow { expected: usize, received: usize },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::InvalidStart => write!(f, "Invalid start marker"),
            ProtocolError::FrameTooLarge { declared, max } => {
                write!(f, "Frame too large: {} bytes (max {})", declared, max)
            }
            ProtocolError::UnexpectedStart => {
                write!(f, "Start marker received before frame was complete")
            }
            ProtocolError::PayloadOverflow { expected, received } => write!(
                f,
                "Payload overflow: expected at most {} bytes, received {}",
                expected, received
            ),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Failure of a single frame reassembly attempt
#[derive(Debug)]
pub enum AssemblyError {
    /// Input violated the wire protocol; the frame is dropped
    Protocol(ProtocolError),
    /// Socket-level failure, including payload read deadlines
    Transport(io::Error),
}

impl AssemblyError {
    /// Whether this is a payload read deadline expiring
    pub fn is_timeout(&self) -> bool {
        matches!(self, AssemblyError::Transport(e) if e.kind() == io::ErrorKind::TimedOut)
    }
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyError::Protocol(e) => write!(f, "Protocol error: {}", e),
            AssemblyError::Transport(e) => write!(f, "Transport error: {}", e),
        }
    }
}

impl std::error::Error for AssemblyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssemblyError::Protocol(e) => Some(e),
            AssemblyError::Transport(e) => Some(e),
        }
    }
}

impl From<ProtocolError> for AssemblyError {
    fn from(err: ProtocolError) -> Self {
        AssemblyError::Protocol(err)
    }
}

impl From<io::Error> for AssemblyError {
    fn from(err: io::Error) -> Self {
        AssemblyError::Transport(err)
    }
}

/// Configuration loading and validation errors
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read
    Io(io::Error),
    /// Config file is not valid YAML for [`RelayConfig`](crate::RelayConfig)
    Parse(serde_yaml::Error),
    /// A value is out of range
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "YAML parse error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Parse(err)
    }
}

/// Crate-level error
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Protocol(ProtocolError),
    Config(ConfigError),
    Registry(RegistryError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Protocol(e) => write!(f, "Protocol error: {}", e),
            Error::Config(e) => write!(f, "Config error: {}", e),
            Error::Registry(e) => write!(f, "Registry error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Protocol(e) => Some(e),
            Error::Config(e) => Some(e),
            Error::Registry(e) => Some(e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<ProtocolError> for Error {
    fn from(err: ProtocolError) -> Self {
        Error::Protocol(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        Error::Registry(err)
    }
}

/// Result alias for crate operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assembly_error_timeout() {
        let err = AssemblyError::from(io::Error::new(io::ErrorKind::TimedOut, "stalled"));
        assert!(err.is_timeout());

        let err = AssemblyError::from(ProtocolError::InvalidStart);
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::FrameTooLarge {
            declared: 600_000,
            max: 500_000,
        };
        assert_eq!(err.to_string(), "Frame too large: 600000 bytes (max 500000)");
    }
}
