//! Status channel
//!
//! Broadcast-only. A watcher gets the room list on connect; later updates are
//! produced by whichever operation changed the room set.

use crate::protocol::OutboundMessage;
use crate::registry::RoomRegistry;
use crate::relay::{Delivery, Target};
use crate::session::ConnectionId;

/// State owned by one status watcher connection
#[derive(Debug)]
pub struct StatusChannel {
    connection: ConnectionId,
}

impl StatusChannel {
    pub fn new(connection: ConnectionId) -> Self {
        Self { connection }
    }

    /// Initial snapshot for the new watcher
    pub fn on_connect(&self, registry: &RoomRegistry) -> Delivery {
        Delivery::new(
            Target::Connection(self.connection),
            OutboundMessage::Rooms(registry.list_room_ids()),
        )
    }
}
