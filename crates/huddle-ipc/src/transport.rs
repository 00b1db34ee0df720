//! Transport abstraction between the two processes.
//!
//! The connection owns its transport by composition: the production pair
//! talks over loopback TCP ([`TcpTransport`]), tests talk over an in-memory
//! duplex pipe ([`MemoryTransport`]). `bind` runs during connection init so
//! the server role knows its ephemeral port before the peer process is even
//! launched; `establish` runs during connect and yields the byte stream.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio::net::{TcpListener, TcpStream};
use tracing::debug;

use crate::config::{IpcConfig, IpcRole};
use crate::error::{IpcError, IpcResult};

/// Loopback address both roles use.
const LOOPBACK: &str = "127.0.0.1";

/// Delay between client dial attempts while the listener is not up yet.
const DIAL_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Buffer capacity of the in-memory test pipe.
const MEMORY_PIPE_CAPACITY: usize = 64 * 1024;

/// A fully established duplex byte pipe.
pub trait TransportStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> TransportStream for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// How a connection obtains its byte pipe.
pub trait Transport: Send + 'static {
    /// The established stream type.
    type Stream: TransportStream;

    /// Reserves local resources. Listener roles return their bound port.
    fn bind(&mut self) -> impl std::future::Future<Output = IpcResult<Option<u16>>> + Send;

    /// Connects or accepts, yielding the established stream.
    fn establish(&mut self) -> impl std::future::Future<Output = IpcResult<Self::Stream>> + Send;
}

/// Loopback TCP transport.
///
/// The server role binds during `bind` and accepts exactly one peer during
/// `establish`; the client role dials with retries until the window closes,
/// so the two processes may start in either order.
pub struct TcpTransport {
    role: IpcRole,
    port: u16,
    connect_timeout: Duration,
    listener: Option<TcpListener>,
}

impl TcpTransport {
    /// Creates a TCP transport for the given role and port.
    pub fn new(role: IpcRole, port: u16, connect_timeout: Duration) -> Self {
        Self {
            role,
            port,
            connect_timeout,
            listener: None,
        }
    }

    /// Creates a TCP transport from a connection config.
    pub fn from_config(config: &IpcConfig) -> Self {
        Self::new(config.role, config.port, config.connect_timeout)
    }

    async fn accept_peer(&mut self) -> IpcResult<TcpStream> {
        let listener = self
            .listener
            .take()
            .ok_or(IpcError::TransportUnavailable {
                reason: "listener not bound",
            })?;

        let accepted = tokio::time::timeout(self.connect_timeout, listener.accept())
            .await
            .map_err(|_| IpcError::connect_timeout(self.connect_timeout))?;
        let (stream, peer) = accepted?;
        debug!(peer = %peer, "accepted peer connection");

        stream.set_nodelay(true)?;
        Ok(stream)
    }

    async fn dial(&self) -> IpcResult<TcpStream> {
        let deadline = tokio::time::Instant::now() + self.connect_timeout;
        loop {
            match TcpStream::connect((LOOPBACK, self.port)).await {
                Ok(stream) => {
                    debug!(port = self.port, "connected to listener");
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(error) => {
                    if tokio::time::Instant::now() + DIAL_RETRY_DELAY >= deadline {
                        debug!(port = self.port, error = %error, "giving up dialing");
                        return Err(IpcError::connect_timeout(self.connect_timeout));
                    }
                    tokio::time::sleep(DIAL_RETRY_DELAY).await;
                }
            }
        }
    }
}

impl Transport for TcpTransport {
    type Stream = TcpStream;

    async fn bind(&mut self) -> IpcResult<Option<u16>> {
        match self.role {
            IpcRole::Server => {
                let listener = TcpListener::bind((LOOPBACK, self.port)).await?;
                let port = listener.local_addr()?.port();
                debug!(port, "listener bound");
                self.listener = Some(listener);
                Ok(Some(port))
            }
            IpcRole::Client => Ok(None),
        }
    }

    async fn establish(&mut self) -> IpcResult<TcpStream> {
        match self.role {
            IpcRole::Server => self.accept_peer().await,
            IpcRole::Client => self.dial().await,
        }
    }
}

/// In-memory transport for tests: a connected pair of duplex pipes.
pub struct MemoryTransport {
    stream: Option<DuplexStream>,
}

impl MemoryTransport {
    /// Creates a connected transport pair.
    pub fn pair() -> (Self, Self) {
        let (a, b) = tokio::io::duplex(MEMORY_PIPE_CAPACITY);
        (Self { stream: Some(a) }, Self { stream: Some(b) })
    }
}

impl Transport for MemoryTransport {
    type Stream = DuplexStream;

    async fn bind(&mut self) -> IpcResult<Option<u16>> {
        Ok(None)
    }

    async fn establish(&mut self) -> IpcResult<DuplexStream> {
        self.stream.take().ok_or(IpcError::TransportUnavailable {
            reason: "memory stream already established",
        })
    }
}
