//! Worker runtime: the business-side event loop.
//!
//! This is the composition root of the worker process. It opens the settings
//! store, builds the [`Dispatcher`] over an engine, dials the hosting
//! process, and then single-threads every unit of work — inbound payloads,
//! engine events, slot-deadline sweeps — through the dispatcher, flushing its
//! reply buffer to the connection after each one. The dispatcher never sees a
//! socket and the connection actor never sees business state.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, interval};
use tracing::{debug, error, info, warn};

use huddle_ipc::{CloseReason, IpcConfig, IpcConnection, IpcError, IpcEvent, TcpTransport};
use huddle_protocol::Envelope;

use crate::dispatch::{DispatchControl, Dispatcher};
use crate::engine::{AuthEngine, EngineEvent, MeetingEngine, MockEngine};
use crate::error::WorkerResult;
use crate::managers::ConfigStore;

/// Default bound on reaching a ready connection after spawn.
pub const DEFAULT_STARTUP_WINDOW_SECS: u64 = 8;

/// How often the runtime sweeps the slot table for expired waits.
const SLOT_SWEEP_PERIOD: Duration = Duration::from_secs(1);

/// Settings file name inside `--config-dir`.
const SETTINGS_FILE: &str = "worker.toml";

/// Tunables for one worker run.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Port the hosting process listens on.
    pub port: u16,
    /// Time allowed to reach a ready connection; the process exits when it
    /// runs out.
    pub startup_window: Duration,
    /// Keep-alive ping interval in seconds; `<= 0` disables pinging.
    pub keep_alive_secs: i64,
    /// Optional bound on pending start/join/leave/login/logout waits.
    pub slot_deadline: Option<Duration>,
    /// Settings directory override; `None` uses the platform default.
    pub config_dir: Option<PathBuf>,
}

impl WorkerSettings {
    /// Settings for dialing the given port, defaults everywhere else.
    pub fn new(port: u16) -> Self {
        Self {
            port,
            startup_window: Duration::from_secs(DEFAULT_STARTUP_WINDOW_SECS),
            keep_alive_secs: huddle_ipc::DEFAULT_KEEP_ALIVE_SECS,
            slot_deadline: None,
            config_dir: None,
        }
    }

    /// Set the startup window.
    #[must_use]
    pub fn with_startup_window(mut self, window: Duration) -> Self {
        self.startup_window = window;
        self
    }

    /// Set the keep-alive ping interval in seconds.
    #[must_use]
    pub fn with_keep_alive_secs(mut self, secs: i64) -> Self {
        self.keep_alive_secs = secs;
        self
    }

    /// Bound every pending operation.
    #[must_use]
    pub fn with_slot_deadline(mut self, deadline: Duration) -> Self {
        self.slot_deadline = Some(deadline);
        self
    }

    /// Store the settings file under `dir` instead of the platform default.
    #[must_use]
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }
}

/// Runs the worker with the stock mock engine.
pub async fn run(settings: WorkerSettings) -> WorkerResult<()> {
    let (engine, events) = MockEngine::new();
    run_with_engine(settings, engine, events).await
}

/// Runs the worker over a caller-supplied engine.
///
/// Returns when the connection closes — orderly or not — or when the dial
/// fails inside the startup window. Abnormal closes stamp the exception
/// marker in the settings store before returning.
pub async fn run_with_engine<E>(
    settings: WorkerSettings,
    engine: E,
    mut engine_events: mpsc::UnboundedReceiver<EngineEvent>,
) -> WorkerResult<()>
where
    E: MeetingEngine + AuthEngine,
{
    let store = open_store(&settings)?;
    if let Some(path) = store.path() {
        debug!(path = %path.display(), "settings store open");
    }
    let mut dispatcher =
        Dispatcher::new(store, engine).with_slot_deadline(settings.slot_deadline);
    dispatcher.recover_previous_run();

    let config = IpcConfig::client(settings.port)
        .with_connect_timeout(settings.startup_window)
        .with_keep_alive_secs(settings.keep_alive_secs);
    let transport = TcpTransport::from_config(&config);
    let mut connection = IpcConnection::new(config, transport);
    connection.initialize().await?;

    info!(port = settings.port, "dialing hosting process");
    if let Err(dial_error) = connection.connect().await {
        error!(
            error = %dial_error,
            window_secs = settings.startup_window.as_secs(),
            "no ready connection within the startup window, exiting"
        );
        return Err(dial_error.into());
    }
    let mut events = connection
        .take_events()
        .ok_or(IpcError::ConnectionClosed)?;
    info!("worker ready");

    let mut replies: Vec<Envelope> = Vec::new();
    let mut sweep = interval(SLOT_SWEEP_PERIOD);
    let mut abnormal_close: Option<String> = None;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(IpcEvent::Ready) => debug!("hosting link ready"),
                Some(IpcEvent::Received(payload)) => {
                    let control = dispatcher.handle_payload(&payload, &mut replies);
                    flush(&connection, &mut replies);
                    if control == DispatchControl::Close {
                        abnormal_close = Some("too many undecodable payloads".into());
                        break;
                    }
                }
                Some(IpcEvent::KeepAliveTimeout) => {
                    // Closed(KeepAliveTimeout) follows; handled there.
                    warn!("hosting process stopped answering keep-alive pings");
                }
                Some(IpcEvent::Closed(reason)) => {
                    match reason {
                        CloseReason::Local | CloseReason::PeerClosed => {
                            info!(%reason, "connection closed");
                        }
                        other => abnormal_close = Some(other.to_string()),
                    }
                    break;
                }
                None => break,
            },
            engine_event = engine_events.recv() => match engine_event {
                Some(event) => {
                    dispatcher.handle_engine_event(event, &mut replies);
                    flush(&connection, &mut replies);
                }
                None => {
                    // An engine that can no longer signal completions cannot
                    // resolve any pending operation.
                    abnormal_close = Some("engine event channel closed".into());
                    break;
                }
            },
            _ = sweep.tick() => {
                dispatcher.expire_slots(Instant::now(), &mut replies);
                flush(&connection, &mut replies);
            }
        }
    }

    if let Some(reason) = abnormal_close {
        dispatcher.record_exception(&reason);
    }
    connection.close().await?;
    info!("worker loop ended");
    Ok(())
}

/// Sends every queued reply, in order.
fn flush(connection: &IpcConnection<TcpTransport>, replies: &mut Vec<Envelope>) {
    for envelope in replies.drain(..) {
        if let Err(error) = connection.send(&envelope) {
            warn!(%error, "dropping undeliverable reply");
        }
    }
}

fn open_store(settings: &WorkerSettings) -> WorkerResult<ConfigStore> {
    match &settings.config_dir {
        Some(dir) => ConfigStore::open(dir.join(SETTINGS_FILE)),
        None => ConfigStore::open_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn startup_window_bounds_the_dial() {
        let dir = tempfile::tempdir().unwrap();
        // Nothing listens on port 1.
        let settings = WorkerSettings::new(1)
            .with_startup_window(Duration::from_millis(300))
            .with_keep_alive_secs(0)
            .with_config_dir(dir.path());

        let started = std::time::Instant::now();
        let result = run(settings).await;
        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn settings_builders_cover_every_knob() {
        let settings = WorkerSettings::new(4700)
            .with_startup_window(Duration::from_secs(5))
            .with_keep_alive_secs(0)
            .with_slot_deadline(Duration::from_secs(30))
            .with_config_dir("/tmp/huddle");

        assert_eq!(settings.port, 4700);
        assert_eq!(settings.startup_window, Duration::from_secs(5));
        assert_eq!(settings.keep_alive_secs, 0);
        assert_eq!(settings.slot_deadline, Some(Duration::from_secs(30)));
        assert_eq!(
            settings.config_dir.as_deref(),
            Some(std::path::Path::new("/tmp/huddle"))
        );
    }
}
