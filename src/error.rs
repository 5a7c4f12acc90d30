//! Error types for transport construction, configuration and message decoding.
//!
//! None of these ever reach a per-event call: publish failures are counted
//! and dropped inside the logger.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while building transports, loading config or decoding messages.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    /// Socket setup or file access failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A message did not match the wire layout.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Configuration file could not be read.
    #[error("failed to read config {}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid YAML for [`Config`](crate::Config).
    #[error("failed to parse config {}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl Error {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Decode(e) => e.as_label(),
            Error::ConfigRead { .. } => "config_read",
            Error::ConfigParse { .. } => "config_parse",
        }
    }
}

/// Reasons a byte buffer is not a valid event message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("message too short: need {need} bytes, got {got}")]
    Truncated { need: usize, got: usize },

    #[error("unknown event kind {0}")]
    UnknownKind(u32),

    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),

    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),
}

impl DecodeError {
    pub fn as_label(&self) -> &'static str {
        match self {
            DecodeError::Truncated { .. } => "decode_truncated",
            DecodeError::UnknownKind(_) => "decode_unknown_kind",
            DecodeError::TrailingBytes(_) => "decode_trailing_bytes",
            DecodeError::InvalidBool(_) => "decode_invalid_bool",
        }
    }
}

/// A transport refused or lost a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("transport queue full")]
    Full,

    #[error("no transport peer")]
    Disconnected,

    #[error("send failed: {0}")]
    Send(String),
}

pub type Result<T> = std::result::Result<T, Error>;
