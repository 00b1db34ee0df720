//! Command-line interface for the worker binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::runtime::WorkerSettings;

/// huddle-worker - out-of-process meeting UI for the huddle hosting library
#[derive(Debug, Parser)]
#[command(name = "huddle-worker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Port the hosting process is listening on
    #[arg(long, env = "HUDDLE_IPC_PORT")]
    pub ipc_port: u16,

    /// Seconds allowed to reach a ready connection before giving up
    #[arg(long, default_value = "8")]
    pub startup_window_secs: u64,

    /// Keep-alive ping interval in seconds (0 disables)
    #[arg(long, default_value = "10")]
    pub keep_alive_secs: i64,

    /// Directory holding the worker settings file
    #[arg(long, env = "HUDDLE_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,
}

impl Cli {
    /// Runtime settings described by these flags.
    pub fn settings(&self) -> WorkerSettings {
        let mut settings = WorkerSettings::new(self.ipc_port)
            .with_startup_window(Duration::from_secs(self.startup_window_secs))
            .with_keep_alive_secs(self.keep_alive_secs);
        if let Some(dir) = &self.config_dir {
            settings = settings.with_config_dir(dir);
        }
        settings
    }
}
