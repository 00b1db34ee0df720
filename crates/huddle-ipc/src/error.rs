//! IPC error types.

use std::io;
use thiserror::Error;

use crate::connection::ConnectionState;

/// Result type for IPC operations.
pub type IpcResult<T> = Result<T, IpcError>;

/// Errors that can occur in the IPC layer.
#[derive(Debug, Error)]
pub enum IpcError {
    /// IO error (socket, stream).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Protocol error (framing, encoding).
    #[error("Protocol error: {0}")]
    Protocol(#[from] huddle_protocol::ProtocolError),

    /// The operation is not legal in the connection's current state.
    #[error("Invalid connection state: expected {expected}, found {found}")]
    InvalidState {
        expected: &'static str,
        found: ConnectionState,
    },

    /// Connect or accept did not complete within the configured window.
    #[error("Connect timed out after {seconds} s")]
    ConnectTimeout { seconds: u64 },

    /// The transport cannot produce a stream (not bound, or already consumed).
    #[error("Transport unavailable: {reason}")]
    TransportUnavailable { reason: &'static str },

    /// The connection task has already terminated.
    #[error("Connection closed")]
    ConnectionClosed,
}

impl IpcError {
    /// Creates an invalid state error.
    pub fn invalid_state(expected: &'static str, found: ConnectionState) -> Self {
        Self::InvalidState { expected, found }
    }

    /// Creates a connect timeout error.
    pub fn connect_timeout(timeout: std::time::Duration) -> Self {
        Self::ConnectTimeout {
            seconds: timeout.as_secs(),
        }
    }
}
