//! Protocol error types.

use thiserror::Error;

/// Errors produced by framing and message (de)serialization.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame payload exceeds the maximum allowed size.
    #[error("frame of {size} bytes exceeds maximum {max} bytes")]
    FrameTooLarge {
        /// Declared or actual payload size.
        size: u32,
        /// The configured maximum.
        max: u32,
    },

    /// Frame header does not start with the protocol magic. The byte stream
    /// is desynchronized and cannot be recovered.
    #[error("bad frame magic 0x{found:04x}")]
    BadMagic {
        /// The two bytes found where the magic was expected.
        found: u16,
    },

    /// Frame header carries a kind byte this version does not know.
    #[error("unknown frame kind 0x{found:02x}")]
    UnknownFrameKind {
        /// The offending kind byte.
        found: u8,
    },

    /// A data frame declared a zero-length payload.
    #[error("data frame with empty payload")]
    EmptyFrame,

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
