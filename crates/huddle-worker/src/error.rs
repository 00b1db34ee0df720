//! Worker error types.

use thiserror::Error;

/// Result type for worker operations.
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors that can occur in the worker process.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// IPC connection error.
    #[error("IPC error: {0}")]
    Ipc(#[from] huddle_ipc::IpcError),

    /// Wire protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] huddle_protocol::ProtocolError),

    /// Settings store error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The engine refused to accept an operation.
    #[error("engine error: {message}")]
    Engine { message: String },
}

impl WorkerError {
    /// Creates a config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an engine error from a message.
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }
}
