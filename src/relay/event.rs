//! Inbound relay events

use crate::protocol::{InboundMessage, Namespace};
use crate::session::ConnectionId;

/// Everything that can happen to the relay
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// A client connected to `namespace`
    Connected {
        connection: ConnectionId,
        namespace: Namespace,
    },
    /// A decoded frame arrived on an existing connection
    Inbound {
        connection: ConnectionId,
        message: InboundMessage,
    },
    /// The connection is gone
    Disconnected { connection: ConnectionId },
}
