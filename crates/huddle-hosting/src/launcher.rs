//! Spawning and supervising the worker process.

use std::path::PathBuf;
use std::process::ExitStatus;

use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::error::{HostError, HostResult};

/// Builds the worker command line and spawns the process.
///
/// The worker is told where to dial with `--ipc-port`; everything else is
/// optional. The child is killed when its [`WorkerHandle`] drops, so an
/// exiting hosting process takes the meeting UI down with it.
#[derive(Debug, Clone)]
pub struct WorkerLauncher {
    program: PathBuf,
    config_dir: Option<PathBuf>,
    startup_window_secs: Option<u64>,
    extra_args: Vec<String>,
}

impl WorkerLauncher {
    /// Launcher for the given worker executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            config_dir: None,
            startup_window_secs: None,
            extra_args: Vec::new(),
        }
    }

    /// Point the worker at a non-default settings directory.
    #[must_use]
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    /// Override the worker's startup window.
    #[must_use]
    pub fn with_startup_window_secs(mut self, secs: u64) -> Self {
        self.startup_window_secs = Some(secs);
        self
    }

    /// Append a raw argument to the worker command line.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// The command that [`spawn`](Self::spawn) runs for the given port.
    pub fn command(&self, port: u16) -> Command {
        let mut command = Command::new(&self.program);
        command.arg("--ipc-port").arg(port.to_string());
        if let Some(dir) = &self.config_dir {
            command.arg("--config-dir").arg(dir);
        }
        if let Some(secs) = self.startup_window_secs {
            command.arg("--startup-window-secs").arg(secs.to_string());
        }
        command.args(&self.extra_args);
        command.kill_on_drop(true);
        command
    }

    /// Spawns the worker, pointed at the given IPC port.
    pub fn spawn(&self, port: u16) -> HostResult<WorkerHandle> {
        let child = self.command(port).spawn().map_err(|error| {
            HostError::Launch(format!(
                "failed to spawn {}: {}",
                self.program.display(),
                error
            ))
        })?;
        info!(
            program = %self.program.display(),
            port,
            pid = ?child.id(),
            "worker spawned"
        );
        Ok(WorkerHandle { child })
    }
}

/// A running worker process.
pub struct WorkerHandle {
    child: Child,
}

impl WorkerHandle {
    /// OS process id, while the child is running.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Waits for the worker to exit.
    pub async fn wait(&mut self) -> HostResult<ExitStatus> {
        let status = self.child.wait().await?;
        debug!(status = %status, "worker exited");
        Ok(status)
    }

    /// Kills the worker and reaps it.
    pub async fn kill(&mut self) -> HostResult<()> {
        self.child.kill().await?;
        Ok(())
    }
}
