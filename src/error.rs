//! Error types for the quality-score codecs.

use thiserror::Error;

/// Error variants for bit I/O and coding operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A read asked for more bits than the stream has left.
    #[error("input exhausted: requested {requested} bits, {remaining} remaining")]
    InputExhausted {
        /// Bits requested by the failing read.
        requested: u64,
        /// Bits still available in the stream.
        remaining: u64,
    },

    /// The caller supplied a parameter the codec cannot honor (e.g. Rice `k` too large).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The bitstream does not describe a valid block.
    #[error("stream corruption: {0}")]
    StreamCorruption(String),

    /// An operation was called out of order.
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// State the operation requires.
        expected: &'static str,
        /// State the coder was in.
        actual: &'static str,
    },

    /// An I/O error from the underlying bit writer or reader.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Error::InvalidParameter(message.into())
    }

    /// Create a stream corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Error::StreamCorruption(message.into())
    }

    /// True if the error means the stream ran out, rather than that it was malformed.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Error::InputExhausted { .. })
    }
}

/// A specialized Result type for codec operations.
pub type Result<T> = std::result::Result<T, Error>;
