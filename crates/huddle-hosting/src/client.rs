//! Typed hosting-side view of the worker link.
//!
//! [`HostingClient`] owns the server end of the launcher↔worker connection:
//! it binds the loopback listener, accepts the worker once it dials in, and
//! splits the raw event stream into request/response calls and a
//! [`WorkerEvent`] stream.
//!
//! The wire has no request ids. Responses correlate by message kind, so the
//! client keeps at most one request of each kind in flight; a second call of
//! the same kind is rejected with [`HostError::Busy`] before anything is
//! written to the socket.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use huddle_core::{
    AccountInfo, JoinMeetingParams, MeetingInfo, MeetingOptions, MenuItem, StartMeetingParams,
};
use huddle_ipc::{
    CloseReason, ConnectionState, DEFAULT_KEEP_ALIVE_SECS, IpcConfig, IpcConnection, IpcError,
    IpcEvent, TcpTransport,
};
use huddle_protocol::{
    Envelope, Message, Notification, Request, RequestKind, Response, RpcResult, decode_message,
};

use crate::error::{HostError, HostResult};

/// Tunables for [`HostingClient::bind`].
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Port to listen on; 0 picks an ephemeral port.
    pub port: u16,
    /// How long [`HostingClient::accept`] waits for the worker to dial in.
    pub accept_timeout: Duration,
    /// Keep-alive ping interval in seconds; `<= 0` disables pinging.
    pub keep_alive_secs: i64,
    /// Upper bound on a single request/response exchange. `None` waits for
    /// as long as the worker takes; start/join legitimately run for the
    /// whole engine join timeout.
    pub call_timeout: Option<Duration>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            port: 0,
            accept_timeout: Duration::from_secs(10),
            keep_alive_secs: DEFAULT_KEEP_ALIVE_SECS,
            call_timeout: None,
        }
    }
}

impl HostConfig {
    /// Listen on a fixed port instead of an ephemeral one.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set how long to wait for the worker to dial in.
    #[must_use]
    pub fn with_accept_timeout(mut self, timeout: Duration) -> Self {
        self.accept_timeout = timeout;
        self
    }

    /// Set the keep-alive ping interval in seconds.
    #[must_use]
    pub fn with_keep_alive_secs(mut self, secs: i64) -> Self {
        self.keep_alive_secs = secs;
        self
    }

    /// Bound every request/response exchange.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }
}

/// Events pushed by the worker outside any request/response exchange.
#[derive(Debug)]
pub enum WorkerEvent {
    /// One-way protocol notification (status changes, menu clicks, auth
    /// session loss).
    Notification(Notification),
    /// The worker stopped answering keep-alive pings; `Closed` follows.
    KeepAliveTimeout,
    /// The link is gone.
    Closed(CloseReason),
}

type PendingTable = HashMap<RequestKind, oneshot::Sender<Response>>;

/// Hosting-side client for the worker process.
///
/// ```no_run
/// use huddle_hosting::{HostConfig, HostingClient, WorkerLauncher};
///
/// # async fn demo() -> Result<(), huddle_hosting::HostError> {
/// let mut client = HostingClient::bind(HostConfig::default()).await?;
/// let worker = WorkerLauncher::new("huddle-worker").spawn(client.port())?;
/// client.accept().await?;
///
/// let result = client.login("alice", "token").await?;
/// assert!(result.is_success());
/// # Ok(())
/// # }
/// ```
pub struct HostingClient {
    connection: IpcConnection<TcpTransport>,
    pending: Arc<Mutex<PendingTable>>,
    events: Option<mpsc::UnboundedReceiver<WorkerEvent>>,
    router: Option<JoinHandle<()>>,
    port: u16,
    call_timeout: Option<Duration>,
}

impl HostingClient {
    /// Binds the loopback listener.
    ///
    /// The returned client is not connected yet: spawn the worker with the
    /// bound [`port`](Self::port), then [`accept`](Self::accept) it.
    pub async fn bind(config: HostConfig) -> HostResult<Self> {
        let ipc = IpcConfig::server(config.port)
            .with_connect_timeout(config.accept_timeout)
            .with_keep_alive_secs(config.keep_alive_secs);
        let transport = TcpTransport::from_config(&ipc);
        let mut connection = IpcConnection::new(ipc, transport);
        let port = connection
            .initialize()
            .await?
            .ok_or(HostError::Ipc(IpcError::TransportUnavailable {
                reason: "listener reported no bound port",
            }))?;
        debug!(port, "hosting listener bound");

        Ok(Self {
            connection,
            pending: Arc::new(Mutex::new(HashMap::new())),
            events: None,
            router: None,
            port,
            call_timeout: config.call_timeout,
        })
    }

    /// The bound listener port, to hand to the worker as `--ipc-port`.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// True while the link accepts calls.
    pub fn is_ready(&self) -> bool {
        self.connection.state() == ConnectionState::Ready
    }

    /// Accepts the worker connection and starts the response router.
    ///
    /// Fails with a connect-timeout error when no worker dials in within
    /// the configured accept timeout.
    pub async fn accept(&mut self) -> HostResult<()> {
        self.connection.connect().await?;
        let events = self
            .connection
            .take_events()
            .ok_or(HostError::ConnectionLost)?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        self.router = Some(tokio::spawn(route_events(
            events,
            Arc::clone(&self.pending),
            event_tx,
        )));
        self.events = Some(event_rx);
        Ok(())
    }

    /// Takes the worker-event stream; yields `Some` exactly once, after
    /// [`accept`](Self::accept).
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<WorkerEvent>> {
        self.events.take()
    }

    /// Sends one request and waits for the response of the same kind.
    pub async fn call(&self, request: Request) -> HostResult<Response> {
        let kind = request.kind();
        let receiver = {
            let mut pending = self.pending.lock().await;
            if pending.contains_key(&kind) {
                return Err(HostError::Busy(kind));
            }
            let (tx, rx) = oneshot::channel();
            pending.insert(kind, tx);
            rx
        };

        if let Err(error) = self.connection.send(&Envelope::request(request)) {
            self.pending.lock().await.remove(&kind);
            return Err(error.into());
        }
        debug!(%kind, "request sent");

        match self.call_timeout {
            None => receiver.await.map_err(|_| HostError::ConnectionLost),
            Some(limit) => match tokio::time::timeout(limit, receiver).await {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(_)) => Err(HostError::ConnectionLost),
                Err(_) => {
                    // A response that still arrives is dropped as unmatched.
                    self.pending.lock().await.remove(&kind);
                    warn!(%kind, timeout_secs = limit.as_secs(), "request timed out");
                    Err(HostError::Timeout(kind))
                }
            },
        }
    }

    /// Creates a meeting and joins it as host.
    ///
    /// The result resolves when the engine reaches a terminal status; watch
    /// the event stream for the intermediate status changes.
    pub async fn start_meeting(
        &self,
        param: StartMeetingParams,
        options: MeetingOptions,
    ) -> HostResult<RpcResult> {
        let response = self.call(Request::start_meeting(param, options)).await?;
        Ok(response.result().clone())
    }

    /// Joins an existing meeting.
    pub async fn join_meeting(
        &self,
        param: JoinMeetingParams,
        options: MeetingOptions,
    ) -> HostResult<RpcResult> {
        let response = self.call(Request::join_meeting(param, options)).await?;
        Ok(response.result().clone())
    }

    /// Leaves the running meeting; `finish` ends it for everyone.
    pub async fn leave_meeting(&self, finish: bool) -> HostResult<RpcResult> {
        let response = self.call(Request::leave_meeting(finish)).await?;
        Ok(response.result().clone())
    }

    /// Authenticates the worker's engine session.
    pub async fn login(
        &self,
        account_id: impl Into<String>,
        token: impl Into<String>,
    ) -> HostResult<RpcResult> {
        let response = self.call(Request::login(account_id, token)).await?;
        Ok(response.result().clone())
    }

    /// Ends the engine session; `cleanup` also drops cached credentials.
    pub async fn logout(&self, cleanup: bool) -> HostResult<RpcResult> {
        let response = self.call(Request::logout(cleanup)).await?;
        Ok(response.result().clone())
    }

    /// Subscribes or unsubscribes remote audio streams.
    pub async fn subscribe_audio_streams(
        &self,
        account_ids: Vec<String>,
        subscribe: bool,
    ) -> HostResult<RpcResult> {
        let response = self
            .call(Request::SubscribeAudioStreams {
                account_ids,
                subscribe,
            })
            .await?;
        Ok(response.result().clone())
    }

    /// Snapshot of the running meeting.
    pub async fn meeting_info(&self) -> HostResult<(RpcResult, MeetingInfo)> {
        match self.call(Request::GetMeetingInfo).await? {
            Response::GetMeetingInfo { result, info } => Ok((result, info)),
            other => Err(unexpected_response(RequestKind::GetMeetingInfo, &other)),
        }
    }

    /// The logged-in account, if any.
    pub async fn account_info(&self) -> HostResult<(RpcResult, AccountInfo)> {
        match self.call(Request::GetAccountInfo).await? {
            Response::GetAccountInfo { result, account } => Ok((result, account)),
            other => Err(unexpected_response(RequestKind::GetAccountInfo, &other)),
        }
    }

    /// Registered built-in menu items for the given ids (all when empty).
    pub async fn preset_menu_items(
        &self,
        item_ids: Vec<i32>,
    ) -> HostResult<(RpcResult, Vec<MenuItem>)> {
        match self.call(Request::GetPresetMenuItems { item_ids }).await? {
            Response::GetPresetMenuItems { result, items } => Ok((result, items)),
            other => Err(unexpected_response(RequestKind::GetPresetMenuItems, &other)),
        }
    }

    /// Pushes the new checked state for a clicked two-state item.
    ///
    /// This is the return path for [`Notification::MenuItemClicked`]; it is
    /// one-way and returns as soon as the notification is queued.
    pub fn set_menu_item_state(
        &self,
        item_id: i32,
        item_guid: impl Into<String>,
        checked_index: i32,
    ) -> HostResult<()> {
        let envelope = Envelope::notification(Notification::MenuItemState {
            item_id,
            item_guid: item_guid.into(),
            checked_index,
        });
        self.connection.send(&envelope)?;
        Ok(())
    }

    /// Closes the link.
    ///
    /// Waits up to the connection's grace period for an orderly shutdown;
    /// calls still in flight fail with [`HostError::ConnectionLost`].
    pub async fn close(&mut self) -> HostResult<()> {
        self.connection.close().await?;
        if let Some(router) = self.router.take() {
            let _ = router.await;
        }
        Ok(())
    }
}

/// Drains connection events: responses into the pending table,
/// notifications and link-level events into the worker-event stream.
async fn route_events(
    mut events: mpsc::UnboundedReceiver<IpcEvent>,
    pending: Arc<Mutex<PendingTable>>,
    event_tx: mpsc::UnboundedSender<WorkerEvent>,
) {
    while let Some(event) = events.recv().await {
        match event {
            IpcEvent::Ready => debug!("worker link ready"),
            IpcEvent::Received(payload) => match decode_message::<Envelope>(&payload) {
                Ok(envelope) => route_envelope(envelope, &pending, &event_tx).await,
                Err(error) => warn!(error = %error, "dropping undecodable message from worker"),
            },
            IpcEvent::KeepAliveTimeout => {
                warn!("worker stopped answering keep-alive pings");
                let _ = event_tx.send(WorkerEvent::KeepAliveTimeout);
            }
            IpcEvent::Closed(reason) => {
                // Dropping the senders wakes every waiting call.
                pending.lock().await.clear();
                let _ = event_tx.send(WorkerEvent::Closed(reason));
                break;
            }
        }
    }
}

async fn route_envelope(
    envelope: Envelope,
    pending: &Mutex<PendingTable>,
    event_tx: &mpsc::UnboundedSender<WorkerEvent>,
) {
    if !envelope.is_compatible() {
        warn!(
            version = %envelope.protocol_version,
            "dropping message with unsupported protocol version"
        );
        return;
    }
    match envelope.message {
        Message::Response(response) => {
            let kind = response.kind();
            match pending.lock().await.remove(&kind) {
                Some(sender) => {
                    if sender.send(response).is_err() {
                        debug!(%kind, "caller gave up before the response arrived");
                    }
                }
                None => warn!(%kind, "response matches no in-flight request"),
            }
        }
        Message::Notification(notification) => {
            let _ = event_tx.send(WorkerEvent::Notification(notification));
        }
        Message::Request(request) => {
            warn!(kind = %request.kind(), "worker sent a request; dropping");
        }
    }
}

fn unexpected_response(expected: RequestKind, got: &Response) -> HostError {
    HostError::Protocol(format!(
        "unexpected {} response to a {} request",
        got.kind(),
        expected
    ))
}
