//! Connection identity
//!
//! Context describing one client connection, shared between the WebSocket
//! task that owns the socket and the hub that routes its events.

use std::fmt;
use std::net::SocketAddr;
use std::time::Instant;

use crate::protocol::Namespace;

/// Unique, process-local connection id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wrap a raw id
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw numeric id
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Context for one accepted connection
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Unique connection id
    pub connection_id: ConnectionId,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Namespace the client connected to
    pub namespace: Namespace,

    /// Connection start time
    pub connected_at: Instant,
}

impl SessionContext {
    /// Create a new context
    pub fn new(connection_id: ConnectionId, peer_addr: SocketAddr, namespace: Namespace) -> Self {
        Self {
            connection_id,
            peer_addr,
            namespace,
            connected_at: Instant::now(),
        }
    }

    /// Time since the connection was accepted
    pub fn duration(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }
}
