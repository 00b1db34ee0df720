//! IPC connection layer for huddle.
//!
//! The hosting (launcher) process and the meeting-UI worker process talk
//! over a single loopback TCP connection. This crate owns that connection:
//!
//! - [`Transport`]: how the byte pipe is obtained — loopback TCP in
//!   production ([`TcpTransport`]), an in-memory duplex pipe in tests
//!   ([`MemoryTransport`]).
//! - [`IpcConnection`]: the connection actor. One dedicated task owns the
//!   stream, assembles frames, answers keep-alive pings and delivers
//!   [`IpcEvent`]s in order; callers enqueue sends and never block.
//! - [`KeepAlive`]: liveness bookkeeping — ping the peer at a fixed
//!   interval once Ready, declare it dead after N silent intervals.
//!
//! ```no_run
//! use huddle_ipc::{IpcConfig, IpcConnection, TcpTransport};
//! use huddle_protocol::{Envelope, Request};
//!
//! # async fn demo() -> Result<(), huddle_ipc::IpcError> {
//! let config = IpcConfig::server(0);
//! let transport = TcpTransport::from_config(&config);
//! let mut connection = IpcConnection::new(config, transport);
//!
//! let port = connection.initialize().await?; // bound ephemeral port
//! connection.connect().await?;               // accepts the worker
//! connection.send(&Envelope::request(Request::GetMeetingInfo))?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod keepalive;
pub mod transport;

pub use config::{
    DEFAULT_KEEP_ALIVE_MISSED_LIMIT, DEFAULT_KEEP_ALIVE_SECS, IpcConfig, IpcRole,
    KEEP_ALIVE_FLOOR_SECS,
};
pub use connection::{CloseReason, ConnectionHandle, ConnectionState, IpcConnection, IpcEvent};
pub use error::{IpcError, IpcResult};
pub use keepalive::KeepAlive;
pub use transport::{MemoryTransport, TcpTransport, Transport, TransportStream};
