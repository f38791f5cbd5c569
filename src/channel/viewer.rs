//! Viewer channel
//!
//! A client on `/display`. Joining a room subscribes the connection to the
//! room group and answers with the room's current structure, or an absent
//! snapshot when the room has not been introduced.

use crate::protocol::OutboundMessage;
use crate::registry::{RoomId, RoomRegistry};
use crate::relay::{Delivery, Target};
use crate::session::ConnectionId;
use crate::subscription::SubscriptionManager;

/// State owned by one viewer connection
#[derive(Debug)]
pub struct ViewerChannel {
    connection: ConnectionId,
    last_joined: Option<RoomId>,
}

impl ViewerChannel {
    pub fn new(connection: ConnectionId) -> Self {
        Self {
            connection,
            last_joined: None,
        }
    }

    /// Room from the most recent join
    pub fn last_joined(&self) -> Option<&RoomId> {
        self.last_joined.as_ref()
    }

    /// Handle `join room`
    ///
    /// The snapshot goes to this connection only.
    pub fn on_join(
        &mut self,
        room: RoomId,
        subscriptions: &mut SubscriptionManager,
        registry: &RoomRegistry,
    ) -> Delivery {
        subscriptions.join(self.connection, &room);
        let snapshot = registry.get_structure(&room);

        tracing::debug!(
            connection = %self.connection,
            room = %room,
            found = snapshot.is_some(),
            "Viewer joined room"
        );

        self.last_joined = Some(room);
        Delivery::new(
            Target::Connection(self.connection),
            OutboundMessage::Tree(snapshot),
        )
    }

    /// Handle disconnect
    pub fn on_disconnect(&mut self, subscriptions: &mut SubscriptionManager) {
        subscriptions.on_disconnect(self.connection);
        self.last_joined = None;
    }
}
