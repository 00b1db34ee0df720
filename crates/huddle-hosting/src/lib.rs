//! Hosting-side library for huddle.
//!
//! The hosting (launcher) process embeds this crate to run a meeting UI out
//! of process: bind a loopback listener, spawn the worker executable
//! pointed at the bound port, then drive it through typed calls and watch
//! its notifications.
//!
//! ```no_run
//! use huddle_hosting::{HostConfig, HostingClient, WorkerEvent, WorkerLauncher};
//!
//! # async fn demo() -> Result<(), huddle_hosting::HostError> {
//! let mut client = HostingClient::bind(HostConfig::default()).await?;
//! let mut worker = WorkerLauncher::new("huddle-worker").spawn(client.port())?;
//! client.accept().await?;
//! let mut events = client.take_events().unwrap();
//!
//! client.login("alice", "token-1").await?;
//! while let Some(event) = events.recv().await {
//!     if let WorkerEvent::Notification(notification) = event {
//!         println!("worker says: {notification:?}");
//!     }
//! }
//!
//! client.close().await?;
//! worker.wait().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod launcher;

pub use client::{HostConfig, HostingClient, WorkerEvent};
pub use error::{HostError, HostResult};
pub use launcher::{WorkerHandle, WorkerLauncher};
