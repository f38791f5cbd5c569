//! Per-connection channel state
//!
//! Each accepted connection gets exactly one channel, chosen by the
//! namespace it connected to. Channels hold only their own connection's
//! state; the registry and subscription tables are passed in by the relay.

pub mod producer;
pub mod status;
pub mod viewer;

pub use producer::{ProducerChannel, ProducerPhase};
pub use status::StatusChannel;
pub use viewer::ViewerChannel;

use crate::protocol::Namespace;
use crate::session::ConnectionId;

/// Channel attached to a connection
#[derive(Debug)]
pub enum Channel {
    Status(StatusChannel),
    Viewer(ViewerChannel),
    Producer(ProducerChannel),
}

impl Channel {
    /// Create the channel for a connection on `namespace`
    pub fn open(namespace: Namespace, connection: ConnectionId) -> Self {
        match namespace {
            Namespace::Status => Channel::Status(StatusChannel::new(connection)),
            Namespace::Display => Channel::Viewer(ViewerChannel::new(connection)),
            Namespace::Accept => Channel::Producer(ProducerChannel::new(connection)),
        }
    }

    /// Namespace this channel belongs to
    pub fn namespace(&self) -> Namespace {
        match self {
            Channel::Status(_) => Namespace::Status,
            Channel::Viewer(_) => Namespace::Display,
            Channel::Producer(_) => Namespace::Accept,
        }
    }
}
