//! Connection configuration.

use std::time::Duration;

/// Default keep-alive ping interval in seconds.
pub const DEFAULT_KEEP_ALIVE_SECS: i64 = 10;

/// Shortest keep-alive interval the connection will honor.
pub const KEEP_ALIVE_FLOOR_SECS: i64 = 3;

/// Default number of silent intervals before the peer is declared dead.
pub const DEFAULT_KEEP_ALIVE_MISSED_LIMIT: u32 = 3;

/// Which side of the loopback socket this connection takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpcRole {
    /// Binds the listener and accepts exactly one peer (the hosting process).
    Server,
    /// Dials the listener (the worker process).
    Client,
}

impl IpcRole {
    /// Returns the role name for logging.
    pub fn name(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Client => "client",
        }
    }
}

/// IPC connection configuration.
#[derive(Debug, Clone)]
pub struct IpcConfig {
    /// Connection role.
    pub role: IpcRole,

    /// Loopback TCP port. 0 lets the server role pick an ephemeral port;
    /// the client role needs the concrete port the server reported.
    pub port: u16,

    /// Window for the transport-level connect or accept.
    pub connect_timeout: Duration,

    /// Keep-alive ping interval in seconds. Values <= 0 disable the
    /// monitor; positive values clamp to [`KEEP_ALIVE_FLOOR_SECS`].
    pub keep_alive_secs: i64,

    /// Silent intervals tolerated before the keep-alive timeout fires.
    pub keep_alive_missed_limit: u32,

    /// Grace period `close` waits for the connection task to acknowledge
    /// shutdown before returning unconditionally.
    pub close_grace: Duration,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            role: IpcRole::Client,
            port: 0,
            connect_timeout: Duration::from_secs(5),
            keep_alive_secs: DEFAULT_KEEP_ALIVE_SECS,
            keep_alive_missed_limit: DEFAULT_KEEP_ALIVE_MISSED_LIMIT,
            close_grace: Duration::from_secs(3),
        }
    }
}

impl IpcConfig {
    /// Creates a server-role configuration for the given port.
    pub fn server(port: u16) -> Self {
        Self {
            role: IpcRole::Server,
            port,
            ..Default::default()
        }
    }

    /// Creates a client-role configuration for the given port.
    pub fn client(port: u16) -> Self {
        Self {
            role: IpcRole::Client,
            port,
            ..Default::default()
        }
    }

    /// Builder: set the connect/accept window.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Builder: set the keep-alive interval in seconds (<= 0 disables).
    pub fn with_keep_alive_secs(mut self, secs: i64) -> Self {
        self.keep_alive_secs = secs;
        self
    }

    /// Builder: set the tolerated missed-interval count.
    pub fn with_keep_alive_missed_limit(mut self, limit: u32) -> Self {
        self.keep_alive_missed_limit = limit;
        self
    }

    /// Builder: set the close grace period.
    pub fn with_close_grace(mut self, grace: Duration) -> Self {
        self.close_grace = grace;
        self
    }

    /// The effective keep-alive interval, or `None` when disabled.
    pub fn keep_alive_interval(&self) -> Option<Duration> {
        if self.keep_alive_secs <= 0 {
            return None;
        }
        let secs = self.keep_alive_secs.max(KEEP_ALIVE_FLOOR_SECS);
        Some(Duration::from_secs(secs as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = IpcConfig::default();
        assert_eq!(config.keep_alive_secs, 10);
        assert_eq!(config.keep_alive_missed_limit, 3);
        assert_eq!(config.close_grace, Duration::from_secs(3));
        assert_eq!(config.keep_alive_interval(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn role_constructors() {
        let server = IpcConfig::server(0);
        assert_eq!(server.role, IpcRole::Server);
        assert_eq!(server.port, 0);

        let client = IpcConfig::client(4600);
        assert_eq!(client.role, IpcRole::Client);
        assert_eq!(client.port, 4600);
    }

    #[test]
    fn zero_or_negative_interval_disables_keep_alive() {
        assert_eq!(IpcConfig::client(0).with_keep_alive_secs(0).keep_alive_interval(), None);
        assert_eq!(
            IpcConfig::client(0).with_keep_alive_secs(-5).keep_alive_interval(),
            None
        );
    }

    #[test]
    fn short_intervals_clamp_to_floor() {
        let config = IpcConfig::client(0).with_keep_alive_secs(1);
        assert_eq!(config.keep_alive_interval(), Some(Duration::from_secs(3)));

        let config = IpcConfig::client(0).with_keep_alive_secs(3);
        assert_eq!(config.keep_alive_interval(), Some(Duration::from_secs(3)));
    }
}
