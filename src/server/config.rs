//! Server configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default listening port
pub const DEFAULT_PORT: u16 = 3000;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent WebSocket connections (0 = unlimited)
    pub max_connections: usize,

    /// Frames buffered per connection before new frames are dropped
    pub outbox_capacity: usize,

    /// Directory holding `index.html`, `tree.html` and per-tree JSON files
    pub public_dir: PathBuf,

    /// Stats log interval
    pub stats_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            max_connections: 0, // Unlimited
            outbox_capacity: 256,
            public_dir: PathBuf::from("public"),
            stats_interval: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set per-connection outbox capacity (at least 1)
    pub fn outbox_capacity(mut self, capacity: usize) -> Self {
        self.outbox_capacity = capacity.max(1);
        self
    }

    /// Set the static file directory
    pub fn public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_dir = dir.into();
        self
    }

    /// Set stats log interval
    pub fn stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval = interval;
        self
    }

    /// Build from process environment
    ///
    /// `PORT` overrides the port, `TREE_RELAY_HOST` the bind address,
    /// `TREE_RELAY_MAX_CONNECTIONS` the connection limit and
    /// `TREE_RELAY_PUBLIC_DIR` the static directory.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("TREE_RELAY_HOST") {
            let ip: IpAddr = raw
                .trim()
                .replace("localhost", "127.0.0.1")
                .parse()
                .map_err(|_| Error::Config(format!("TREE_RELAY_HOST: invalid address '{}'", raw)))?;
            config.bind_addr.set_ip(ip);
        }

        if let Some(raw) = lookup("PORT") {
            let port: u16 = raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("PORT: invalid port '{}'", raw)))?;
            config.bind_addr.set_port(port);
        }

        if let Some(raw) = lookup("TREE_RELAY_MAX_CONNECTIONS") {
            config.max_connections = raw.trim().parse().map_err(|_| {
                Error::Config(format!("TREE_RELAY_MAX_CONNECTIONS: invalid count '{}'", raw))
            })?;
        }

        if let Some(raw) = lookup("TREE_RELAY_PUBLIC_DIR") {
            config.public_dir = PathBuf::from(raw);
        }

        Ok(config)
    }
}
