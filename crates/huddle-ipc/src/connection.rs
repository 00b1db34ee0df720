//! The IPC connection actor.
//!
//! One connection owns one transport stream and one dedicated tokio task.
//! All socket I/O, frame assembly, keep-alive bookkeeping and event delivery
//! happen on that task; callers talk to it through a typed command channel
//! and listen on a typed event channel, so no connection state is ever
//! locked or shared.
//!
//! Lifecycle: `Uninitialized` → [`initialize`](IpcConnection::initialize)
//! (server role binds here, so the ephemeral port is known before the peer
//! process launches) → `Initialized` → [`connect`](IpcConnection::connect)
//! → `Ready` → [`close`](IpcConnection::close) → `Closing` → `Closed`.
//! A fatal transport or framing error also moves the connection to `Closed`
//! after a `Closed` event carrying the reason.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use huddle_protocol::{Envelope, FrameDecoder, FrameKind, encode_message, pack_frame};

use crate::config::IpcConfig;
use crate::error::{IpcError, IpcResult};
use crate::keepalive::KeepAlive;
use crate::transport::{Transport, TransportStream};

/// Size of the stream read buffer.
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    Initialized,
    Connecting,
    Ready,
    Closing,
    Closed,
}

impl ConnectionState {
    /// Returns the state name for logging.
    pub fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Connecting => "connecting",
            Self::Ready => "ready",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a connection closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// A local `close` call.
    Local,
    /// The peer shut its end down.
    PeerClosed,
    /// The keep-alive monitor declared the peer dead.
    KeepAliveTimeout,
    /// A transport or framing failure; the stream can no longer be trusted.
    Error(String),
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => f.write_str("closed locally"),
            Self::PeerClosed => f.write_str("peer closed"),
            Self::KeepAliveTimeout => f.write_str("keep-alive timeout"),
            Self::Error(reason) => write!(f, "error: {reason}"),
        }
    }
}

/// Events delivered from the connection's own task, in order.
///
/// `Ready` is always first and `Closed` always last; `Received` fires once
/// per fully decoded data frame, in arrival order. Keep-alive ping/pong
/// frames are handled inside the connection and never surface here.
#[derive(Debug)]
pub enum IpcEvent {
    /// The transport is established and the connection accepts sends.
    Ready,
    /// Payload of one inbound data frame.
    Received(Vec<u8>),
    /// The peer went silent past the keep-alive budget; close follows.
    KeepAliveTimeout,
    /// The connection finished closing.
    Closed(CloseReason),
}

/// Commands accepted by the connection task.
#[derive(Debug)]
enum Command {
    /// Write one pre-packed frame.
    Send(Vec<u8>),
    /// Shut down; `ack` fires once the task acknowledges.
    Close { ack: oneshot::Sender<()> },
}

/// An IPC connection between the hosting and worker processes.
///
/// Generic over its [`Transport`] so tests can swap loopback TCP for an
/// in-memory pipe.
pub struct IpcConnection<T: Transport> {
    config: IpcConfig,
    transport: Option<T>,
    local_port: Option<u16>,
    state: Arc<watch::Sender<ConnectionState>>,
    command_tx: mpsc::UnboundedSender<Command>,
    command_rx: Option<mpsc::UnboundedReceiver<Command>>,
    event_tx: Option<mpsc::UnboundedSender<IpcEvent>>,
    event_rx: Option<mpsc::UnboundedReceiver<IpcEvent>>,
    task: Option<JoinHandle<()>>,
}

impl<T: Transport> IpcConnection<T> {
    /// Creates a connection in the `Uninitialized` state.
    pub fn new(config: IpcConfig, transport: T) -> Self {
        let (state, _) = watch::channel(ConnectionState::Uninitialized);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            config,
            transport: Some(transport),
            local_port: None,
            state: Arc::new(state),
            command_tx,
            command_rx: Some(command_rx),
            event_tx: Some(event_tx),
            event_rx: Some(event_rx),
            task: None,
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Subscribes to lifecycle state changes.
    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// The bound local port, once the server role has initialized.
    pub fn local_port(&self) -> Option<u16> {
        self.local_port
    }

    /// Takes the event receiver; yields `None` after the first call.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<IpcEvent>> {
        self.event_rx.take()
    }

    /// Returns a cloneable handle for sending and closing from other tasks.
    pub fn handle(&self) -> ConnectionHandle {
        ConnectionHandle {
            command_tx: self.command_tx.clone(),
            state_rx: self.state.subscribe(),
            close_grace: self.config.close_grace,
        }
    }

    /// Binds local transport resources.
    ///
    /// Legal only in `Uninitialized`. For the server role this binds the
    /// listener and returns the bound port; the client role returns `None`.
    pub async fn initialize(&mut self) -> IpcResult<Option<u16>> {
        let state = self.state();
        if state != ConnectionState::Uninitialized {
            return Err(IpcError::invalid_state("uninitialized", state));
        }
        let transport = self
            .transport
            .as_mut()
            .ok_or(IpcError::TransportUnavailable {
                reason: "transport already consumed",
            })?;

        let port = transport.bind().await?;
        self.local_port = port;
        self.state.send_replace(ConnectionState::Initialized);
        debug!(role = self.config.role.name(), port = ?port, "connection initialized");
        Ok(port)
    }

    /// Establishes the transport and starts the connection task.
    ///
    /// Legal only in `Initialized`. On return the connection is `Ready` and
    /// the event stream begins with [`IpcEvent::Ready`].
    pub async fn connect(&mut self) -> IpcResult<()> {
        let state = self.state();
        if state != ConnectionState::Initialized {
            return Err(IpcError::invalid_state("initialized", state));
        }
        let mut transport = self.transport.take().ok_or(IpcError::TransportUnavailable {
            reason: "transport already consumed",
        })?;

        self.state.send_replace(ConnectionState::Connecting);
        let stream = match transport.establish().await {
            Ok(stream) => stream,
            Err(error) => {
                self.state.send_replace(ConnectionState::Closed);
                return Err(error);
            }
        };

        let command_rx = self.command_rx.take().ok_or(IpcError::ConnectionClosed)?;
        let event_tx = self.event_tx.take().ok_or(IpcError::ConnectionClosed)?;
        let actor = ConnectionActor {
            stream,
            decoder: FrameDecoder::new(),
            command_rx,
            event_tx,
            state: Arc::clone(&self.state),
            keep_alive: KeepAlive::from_config(&self.config, Instant::now()),
        };

        self.state.send_replace(ConnectionState::Ready);
        self.task = Some(tokio::spawn(actor.run()));
        debug!(role = self.config.role.name(), "connection ready");
        Ok(())
    }

    /// Enqueues one envelope for transmission, in FIFO order.
    ///
    /// Returns immediately; legal only in `Ready`.
    pub fn send(&self, envelope: &Envelope) -> IpcResult<()> {
        enqueue_envelope(&self.command_tx, self.state(), envelope)
    }

    /// Closes the connection.
    ///
    /// Waits up to the configured grace period for the connection task to
    /// acknowledge shutdown, then returns unconditionally. Idempotent.
    pub async fn close(&mut self) -> IpcResult<()> {
        match self.state() {
            ConnectionState::Uninitialized | ConnectionState::Initialized => {
                self.state.send_replace(ConnectionState::Closed);
                return Ok(());
            }
            ConnectionState::Closed => return Ok(()),
            _ => {}
        }

        let acked = request_close(&self.command_tx, self.config.close_grace).await;
        if let Some(task) = self.task.take() {
            if acked {
                let _ = task.await;
            } else {
                warn!(
                    grace_secs = self.config.close_grace.as_secs(),
                    "close grace expired, aborting connection task"
                );
                task.abort();
            }
        }
        self.state.send_replace(ConnectionState::Closed);
        Ok(())
    }
}

/// Cloneable handle onto a running connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    command_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
    close_grace: Duration,
}

impl ConnectionHandle {
    /// The current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// True while the connection accepts sends.
    pub fn is_ready(&self) -> bool {
        self.state() == ConnectionState::Ready
    }

    /// Enqueues one envelope for transmission, in FIFO order.
    pub fn send(&self, envelope: &Envelope) -> IpcResult<()> {
        enqueue_envelope(&self.command_tx, self.state(), envelope)
    }

    /// Requests close and waits up to the grace period for the ack.
    pub async fn close(&self) {
        request_close(&self.command_tx, self.close_grace).await;
    }

    /// Waits until the connection leaves `Ready` (close or fatal error).
    pub async fn closed(&mut self) {
        let _ = self
            .state_rx
            .wait_for(|state| *state == ConnectionState::Closed)
            .await;
    }
}

fn enqueue_envelope(
    command_tx: &mpsc::UnboundedSender<Command>,
    state: ConnectionState,
    envelope: &Envelope,
) -> IpcResult<()> {
    if state != ConnectionState::Ready {
        return Err(IpcError::invalid_state("ready", state));
    }
    let bytes = encode_message(envelope)?;
    command_tx
        .send(Command::Send(bytes))
        .map_err(|_| IpcError::ConnectionClosed)
}

/// Returns true when the task acknowledged (or had already exited).
async fn request_close(command_tx: &mpsc::UnboundedSender<Command>, grace: Duration) -> bool {
    let (ack_tx, ack_rx) = oneshot::channel();
    if command_tx.send(Command::Close { ack: ack_tx }).is_err() {
        return true;
    }
    match tokio::time::timeout(grace, ack_rx).await {
        Ok(result) => result.is_ok(),
        Err(_) => false,
    }
}

/// The task that owns the stream.
struct ConnectionActor<S> {
    stream: S,
    decoder: FrameDecoder,
    command_rx: mpsc::UnboundedReceiver<Command>,
    event_tx: mpsc::UnboundedSender<IpcEvent>,
    state: Arc<watch::Sender<ConnectionState>>,
    keep_alive: Option<KeepAlive>,
}

impl<S: TransportStream> ConnectionActor<S> {
    async fn run(mut self) {
        let _ = self.event_tx.send(IpcEvent::Ready);

        // interval_at skips the immediate first tick a plain interval fires.
        let mut ping_ticker = self.keep_alive.as_ref().map(|keep_alive| {
            let period = keep_alive.interval();
            tokio::time::interval_at(Instant::now() + period, period)
        });
        let mut read_buf = vec![0u8; READ_BUFFER_SIZE];

        let reason = loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(Command::Send(bytes)) => {
                        if let Err(error) = self.stream.write_all(&bytes).await {
                            break CloseReason::Error(format!("write failed: {error}"));
                        }
                    }
                    Some(Command::Close { ack }) => {
                        self.state.send_replace(ConnectionState::Closing);
                        let _ = ack.send(());
                        break CloseReason::Local;
                    }
                    // Owner dropped without close; wind down quietly.
                    None => break CloseReason::Local,
                },
                read = self.stream.read(&mut read_buf) => match read {
                    Ok(0) => break CloseReason::PeerClosed,
                    Ok(n) => {
                        if let Some(keep_alive) = self.keep_alive.as_mut() {
                            keep_alive.record_inbound(Instant::now());
                        }
                        self.decoder.feed(&read_buf[..n]);
                        if let Err(reason) = self.drain_frames().await {
                            break reason;
                        }
                    }
                    Err(error) => break CloseReason::Error(format!("read failed: {error}")),
                },
                _ = maybe_tick(&mut ping_ticker) => {
                    if let Some(reason) = self.on_ping_tick().await {
                        break reason;
                    }
                }
            }
        };

        let _ = self.stream.shutdown().await;
        self.state.send_replace(ConnectionState::Closed);
        debug!(reason = %reason, "connection closed");
        let _ = self.event_tx.send(IpcEvent::Closed(reason));
    }

    /// Extracts every complete frame buffered so far, in arrival order.
    ///
    /// Framing corruption is fatal: once the byte stream is misaligned no
    /// later frame boundary can be trusted.
    async fn drain_frames(&mut self) -> Result<(), CloseReason> {
        loop {
            match self.decoder.try_extract() {
                Ok(Some(frame)) => match frame.kind {
                    FrameKind::Data => {
                        let _ = self.event_tx.send(IpcEvent::Received(frame.payload));
                    }
                    FrameKind::Ping => self.write_control(FrameKind::Pong).await?,
                    // Pong already counted as inbound traffic.
                    FrameKind::Pong => {}
                },
                Ok(None) => return Ok(()),
                Err(error) => return Err(CloseReason::Error(format!("framing error: {error}"))),
            }
        }
    }

    async fn on_ping_tick(&mut self) -> Option<CloseReason> {
        if let Some(keep_alive) = self.keep_alive.as_ref() {
            if keep_alive.timed_out(Instant::now()) {
                let _ = self.event_tx.send(IpcEvent::KeepAliveTimeout);
                return Some(CloseReason::KeepAliveTimeout);
            }
        }
        match self.write_control(FrameKind::Ping).await {
            Ok(()) => None,
            Err(reason) => Some(reason),
        }
    }

    async fn write_control(&mut self, kind: FrameKind) -> Result<(), CloseReason> {
        let bytes = pack_frame(kind, &[])
            .map_err(|error| CloseReason::Error(format!("pack control frame: {error}")))?;
        self.stream
            .write_all(&bytes)
            .await
            .map_err(|error| CloseReason::Error(format!("write control frame: {error}")))
    }
}

/// Ticks the keep-alive interval, or parks forever when disabled.
async fn maybe_tick(ticker: &mut Option<tokio::time::Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MemoryTransport, TcpTransport};
    use huddle_protocol::{Request, decode_message};

    async fn memory_pair(
        config_a: IpcConfig,
        config_b: IpcConfig,
    ) -> (
        IpcConnection<MemoryTransport>,
        IpcConnection<MemoryTransport>,
    ) {
        let (ta, tb) = MemoryTransport::pair();
        let mut a = IpcConnection::new(config_a, ta);
        let mut b = IpcConnection::new(config_b, tb);
        a.initialize().await.unwrap();
        b.initialize().await.unwrap();
        a.connect().await.unwrap();
        b.connect().await.unwrap();
        (a, b)
    }

    fn quiet_config() -> IpcConfig {
        IpcConfig::client(0).with_keep_alive_secs(0)
    }

    #[tokio::test]
    async fn connect_requires_initialize() {
        let (transport, _peer) = MemoryTransport::pair();
        let mut connection = IpcConnection::new(quiet_config(), transport);
        let result = connection.connect().await;
        assert!(matches!(result, Err(IpcError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn send_requires_ready() {
        let (transport, _peer) = MemoryTransport::pair();
        let connection = IpcConnection::new(quiet_config(), transport);
        let envelope = Envelope::request(Request::GetMeetingInfo);
        let result = connection.send(&envelope);
        assert!(matches!(result, Err(IpcError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn ready_event_comes_first() {
        let (mut a, _b) = memory_pair(quiet_config(), quiet_config()).await;
        assert_eq!(a.state(), ConnectionState::Ready);

        let mut events = a.take_events().unwrap();
        assert!(matches!(events.recv().await, Some(IpcEvent::Ready)));
        assert!(a.take_events().is_none());
    }

    #[tokio::test]
    async fn envelopes_arrive_in_send_order() {
        let (a, mut b) = memory_pair(quiet_config(), quiet_config()).await;
        let mut events = b.take_events().unwrap();
        assert!(matches!(events.recv().await, Some(IpcEvent::Ready)));

        a.send(&Envelope::request(Request::GetMeetingInfo)).unwrap();
        a.send(&Envelope::request(Request::GetAccountInfo)).unwrap();
        a.send(&Envelope::request(Request::leave_meeting(true)))
            .unwrap();

        let mut received = Vec::new();
        while received.len() < 3 {
            match events.recv().await {
                Some(IpcEvent::Received(payload)) => {
                    received.push(decode_message::<Envelope>(&payload).unwrap());
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }

        assert_eq!(received[0], Envelope::request(Request::GetMeetingInfo));
        assert_eq!(received[1], Envelope::request(Request::GetAccountInfo));
        assert_eq!(received[2], Envelope::request(Request::leave_meeting(true)));
    }

    #[tokio::test]
    async fn local_close_notifies_the_peer() {
        let (mut a, mut b) = memory_pair(quiet_config(), quiet_config()).await;
        let mut events_a = a.take_events().unwrap();
        let mut events_b = b.take_events().unwrap();
        assert!(matches!(events_a.recv().await, Some(IpcEvent::Ready)));
        assert!(matches!(events_b.recv().await, Some(IpcEvent::Ready)));

        a.close().await.unwrap();
        assert_eq!(a.state(), ConnectionState::Closed);
        assert!(matches!(
            events_a.recv().await,
            Some(IpcEvent::Closed(CloseReason::Local))
        ));

        assert!(matches!(
            events_b.recv().await,
            Some(IpcEvent::Closed(CloseReason::PeerClosed))
        ));

        // Closing again is a no-op.
        a.close().await.unwrap();
        b.close().await.unwrap();
    }

    #[tokio::test]
    async fn close_before_connect_just_marks_closed() {
        let (transport, _peer) = MemoryTransport::pair();
        let mut connection = IpcConnection::new(quiet_config(), transport);
        connection.close().await.unwrap();
        assert_eq!(connection.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn send_after_close_is_rejected() {
        let (mut a, _b) = memory_pair(quiet_config(), quiet_config()).await;
        a.close().await.unwrap();
        let result = a.send(&Envelope::request(Request::GetMeetingInfo));
        assert!(matches!(result, Err(IpcError::InvalidState { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn keep_alive_timeout_fires_after_missed_intervals() {
        let config = IpcConfig::client(0)
            .with_keep_alive_secs(3)
            .with_keep_alive_missed_limit(3);
        let (ta, tb) = MemoryTransport::pair();
        let mut connection = IpcConnection::new(config, ta);
        connection.initialize().await.unwrap();
        connection.connect().await.unwrap();
        let mut events = connection.take_events().unwrap();

        // Keep the peer endpoint alive but silent.
        let _silent_peer = tb;

        assert!(matches!(events.recv().await, Some(IpcEvent::Ready)));
        assert!(matches!(
            events.recv().await,
            Some(IpcEvent::KeepAliveTimeout)
        ));
        assert!(matches!(
            events.recv().await,
            Some(IpcEvent::Closed(CloseReason::KeepAliveTimeout))
        ));
        assert_eq!(connection.state(), ConnectionState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_keep_alive_never_pings() {
        let (ta, tb) = MemoryTransport::pair();
        let mut connection = IpcConnection::new(quiet_config(), ta);
        connection.initialize().await.unwrap();
        connection.connect().await.unwrap();
        let mut events = connection.take_events().unwrap();
        let _silent_peer = tb;

        assert!(matches!(events.recv().await, Some(IpcEvent::Ready)));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(events.try_recv().is_err());
        assert_eq!(connection.state(), ConnectionState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn answering_peers_stay_alive() {
        let config = IpcConfig::client(0)
            .with_keep_alive_secs(3)
            .with_keep_alive_missed_limit(2);
        let (mut a, mut b) = memory_pair(config.clone(), config).await;
        let mut events_a = a.take_events().unwrap();
        assert!(matches!(events_a.recv().await, Some(IpcEvent::Ready)));

        tokio::time::sleep(Duration::from_secs(30)).await;

        assert!(events_a.try_recv().is_err());
        assert_eq!(a.state(), ConnectionState::Ready);
        assert_eq!(b.state(), ConnectionState::Ready);
    }

    #[tokio::test]
    async fn tcp_roundtrip_end_to_end() {
        let server_config = IpcConfig::server(0).with_keep_alive_secs(0);
        let mut server = IpcConnection::new(
            server_config.clone(),
            TcpTransport::from_config(&server_config),
        );
        let port = server.initialize().await.unwrap().unwrap();

        let client_task = tokio::spawn(async move {
            let client_config = IpcConfig::client(port).with_keep_alive_secs(0);
            let mut client = IpcConnection::new(
                client_config.clone(),
                TcpTransport::from_config(&client_config),
            );
            client.initialize().await.unwrap();
            client.connect().await.unwrap();
            client
                .send(&Envelope::request(Request::login("u-1", "tok")))
                .unwrap();
            let mut events = client.take_events().unwrap();
            assert!(matches!(events.recv().await, Some(IpcEvent::Ready)));
            client
        });

        server.connect().await.unwrap();
        let mut events = server.take_events().unwrap();
        assert!(matches!(events.recv().await, Some(IpcEvent::Ready)));
        let payload = match events.recv().await {
            Some(IpcEvent::Received(payload)) => payload,
            other => panic!("unexpected event: {other:?}"),
        };
        let envelope: Envelope = decode_message(&payload).unwrap();
        assert_eq!(envelope, Envelope::request(Request::login("u-1", "tok")));

        let mut client = client_task.await.unwrap();
        client.close().await.unwrap();
        server.close().await.unwrap();
    }

    #[tokio::test]
    async fn handle_sends_and_reports_state() {
        let (a, mut b) = memory_pair(quiet_config(), quiet_config()).await;
        let mut handle = a.handle();
        assert!(handle.is_ready());

        handle
            .send(&Envelope::request(Request::GetAccountInfo))
            .unwrap();

        let mut events = b.take_events().unwrap();
        assert!(matches!(events.recv().await, Some(IpcEvent::Ready)));
        assert!(matches!(events.recv().await, Some(IpcEvent::Received(_))));

        handle.close().await;
        handle.closed().await;
        assert_eq!(handle.state(), ConnectionState::Closed);
    }
}
