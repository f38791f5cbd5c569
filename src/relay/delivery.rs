//! Outbound deliveries
//!
//! Handlers never touch sockets. They return deliveries addressed to a
//! target, and the hub expands each target into concrete connections.

use crate::protocol::OutboundMessage;
use crate::registry::RoomId;
use crate::session::ConnectionId;

/// Who a delivery is addressed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A single connection
    Connection(ConnectionId),
    /// Every viewer joined to the room at dispatch time
    Room(RoomId),
    /// Every connected status watcher
    StatusWatchers,
}

/// A message plus its target
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub target: Target,
    pub message: OutboundMessage,
}

impl Delivery {
    pub fn new(target: Target, message: OutboundMessage) -> Self {
        Self { target, message }
    }
}
