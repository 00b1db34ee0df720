//! Worker process for huddle.
//!
//! The worker is the out-of-process meeting UI: spawned by the hosting
//! library with `--ipc-port`, it dials the hosting process over loopback TCP
//! and serves the v1 protocol. Inside, a single [`Dispatcher`] owns all
//! business state — auth, meeting, settings and menu managers, the
//! pending-slot table — and drives the meeting backend through the
//! [`MeetingEngine`]/[`AuthEngine`] seams; [`runtime`] wires those pieces to
//! the connection and runs the loop.

pub mod cli;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod managers;
pub mod runtime;

pub use cli::Cli;
pub use dispatch::{DecodeErrorPolicy, DispatchControl, Dispatcher};
pub use engine::{AuthEngine, EngineEvent, MeetingEngine, MockEngine};
pub use error::{WorkerError, WorkerResult};
pub use runtime::{WorkerSettings, run, run_with_engine};
