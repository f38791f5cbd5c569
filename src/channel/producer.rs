//! Producer channel
//!
//! Per-connection state for a client on `/accept`:
//!
//! ```text
//! Idle ──introduce(r)──► Bound(r) ──introduce(r')──► Bound(r')
//!  │                      │  ▲
//!  │                      └──┘ step
//!  └────────disconnect────┴──────────────────────► Terminated
//! ```
//!
//! The bound room is the implicit target of steps that carry no room id.

use crate::protocol::OutboundMessage;
use crate::registry::{RegistryConfig, RoomId, RoomRegistry, StepEvent, Structure};
use crate::relay::{Delivery, Target};
use crate::session::ConnectionId;

/// Producer lifecycle phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProducerPhase {
    /// Connected, nothing introduced yet
    Idle,
    /// Most recently introduced room
    Bound(RoomId),
    /// Disconnected
    Terminated,
}

/// State owned by one producer connection
#[derive(Debug)]
pub struct ProducerChannel {
    connection: ConnectionId,
    phase: ProducerPhase,
}

impl ProducerChannel {
    /// Create a channel in the `Idle` phase
    pub fn new(connection: ConnectionId) -> Self {
        Self {
            connection,
            phase: ProducerPhase::Idle,
        }
    }

    /// Current phase
    pub fn phase(&self) -> &ProducerPhase {
        &self.phase
    }

    /// Room remembered from the last introduce
    pub fn bound_room(&self) -> Option<&RoomId> {
        match &self.phase {
            ProducerPhase::Bound(room) => Some(room),
            _ => None,
        }
    }

    /// Handle `introduce`
    ///
    /// Replaces the room's structure, pushes it to the room's viewers and,
    /// if the room is new, pushes the room list to status watchers.
    pub fn on_introduce(
        &mut self,
        room: RoomId,
        structure: Structure,
        registry: &mut RoomRegistry,
    ) -> Vec<Delivery> {
        if self.phase == ProducerPhase::Terminated {
            return Vec::new();
        }

        let introduced = registry.introduce(room.clone(), structure.clone(), self.connection);

        let mut deliveries = vec![Delivery::new(
            Target::Room(room.clone()),
            OutboundMessage::Tree(Some(structure)),
        )];
        if introduced.is_new_room() {
            deliveries.push(Delivery::new(
                Target::StatusWatchers,
                OutboundMessage::Rooms(registry.list_room_ids()),
            ));
        }

        self.phase = ProducerPhase::Bound(room);
        deliveries
    }

    /// Resolve the room a step targets
    ///
    /// An explicit room wins over the remembered one. `None` means the step
    /// has nowhere to go and is dropped.
    pub fn resolve_step_room(&self, explicit: Option<RoomId>) -> Option<RoomId> {
        if self.phase == ProducerPhase::Terminated {
            return None;
        }
        explicit.or_else(|| self.bound_room().cloned())
    }

    /// Handle `step`
    pub fn on_step(&self, step: StepEvent, explicit: Option<RoomId>) -> Option<Delivery> {
        let room = self.resolve_step_room(explicit)?;
        Some(Delivery::new(Target::Room(room), OutboundMessage::Step(step)))
    }

    /// Handle disconnect
    ///
    /// Rooms this producer still owns become orphaned. With
    /// `delete_room_on_producer_disconnect` set, the remembered room is
    /// removed as well. `spare_taken_over_rooms` keeps it when another
    /// producer has since introduced it.
    pub fn on_disconnect(
        &mut self,
        registry: &mut RoomRegistry,
        config: &RegistryConfig,
    ) -> Vec<Delivery> {
        let phase = std::mem::replace(&mut self.phase, ProducerPhase::Terminated);

        let removed = match phase {
            ProducerPhase::Bound(room) if config.delete_room_on_producer_disconnect => {
                if config.spare_taken_over_rooms {
                    registry.remove_owned(&room, self.connection)
                } else {
                    registry.remove(&room)
                }
            }
            _ => false,
        };

        registry.release_producer(self.connection);

        if removed {
            vec![Delivery::new(
                Target::StatusWatchers,
                OutboundMessage::Rooms(registry.list_room_ids()),
            )]
        } else {
            Vec::new()
        }
    }
}
