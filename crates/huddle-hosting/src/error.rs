//! Hosting-side error types.

use std::fmt;

use huddle_ipc::IpcError;
use huddle_protocol::{ProtocolError, RequestKind};

/// Result type for hosting-side operations.
pub type HostResult<T> = Result<T, HostError>;

/// Errors that can occur on the hosting side of the worker link.
#[derive(Debug)]
pub enum HostError {
    /// IO error.
    Io(std::io::Error),
    /// Connection-layer failure.
    Ipc(IpcError),
    /// Envelope encode/decode failure.
    Protocol(String),
    /// A request of this kind is already waiting for its response.
    Busy(RequestKind),
    /// The call timeout elapsed before the worker answered.
    Timeout(RequestKind),
    /// The connection closed while a call was waiting.
    ConnectionLost,
    /// Spawning the worker process failed.
    Launch(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Ipc(err) => write!(f, "connection error: {}", err),
            Self::Protocol(msg) => write!(f, "protocol error: {}", msg),
            Self::Busy(kind) => write!(f, "a {} request is already in flight", kind),
            Self::Timeout(kind) => write!(f, "{} timed out waiting for the worker", kind),
            Self::ConnectionLost => write!(f, "connection to the worker closed"),
            Self::Launch(msg) => write!(f, "worker launch failed: {}", msg),
        }
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Ipc(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for HostError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<IpcError> for HostError {
    fn from(err: IpcError) -> Self {
        Self::Ipc(err)
    }
}

impl From<ProtocolError> for HostError {
    fn from(err: ProtocolError) -> Self {
        Self::Protocol(err.to_string())
    }
}
