//! Wire messages
//!
//! Every frame is an event name plus positional arguments. Inbound messages
//! are only valid on the namespace that owns them.

use std::fmt;
use std::str::FromStr;

use crate::registry::{RoomId, StepEvent, Structure};

/// Event names
pub mod event {
    pub const ROOMS: &str = "rooms";
    pub const JOIN_ROOM: &str = "join room";
    pub const TREE: &str = "tree";
    pub const INTRODUCE: &str = "introduce";
    pub const STEP: &str = "step";
}

/// Logical channel a client connects to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Receives the live room list
    Status,
    /// Joins rooms and receives their trees and steps
    Display,
    /// Producers introduce trees and emit steps
    Accept,
}

impl Namespace {
    /// All namespaces
    pub const ALL: [Namespace; 3] = [Namespace::Status, Namespace::Display, Namespace::Accept];

    /// Namespace name
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Status => "status",
            Namespace::Display => "display",
            Namespace::Accept => "accept",
        }
    }

    /// WebSocket endpoint path
    pub fn path(self) -> &'static str {
        match self {
            Namespace::Status => "/ws/status",
            Namespace::Display => "/ws/display",
            Namespace::Accept => "/ws/accept",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status" => Ok(Namespace::Status),
            "display" => Ok(Namespace::Display),
            "accept" => Ok(Namespace::Accept),
            other => Err(format!("unknown namespace '{}'", other)),
        }
    }
}

/// Client-to-server message
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Viewer subscribes to a room (`display`)
    JoinRoom(RoomId),

    /// Producer creates or replaces a room (`accept`)
    Introduce { room: RoomId, structure: Structure },

    /// Producer emits a step (`accept`); `room` overrides the remembered room
    Step {
        step: StepEvent,
        room: Option<RoomId>,
    },
}

impl InboundMessage {
    /// Wire event name
    pub fn event_name(&self) -> &'static str {
        match self {
            InboundMessage::JoinRoom(_) => event::JOIN_ROOM,
            InboundMessage::Introduce { .. } => event::INTRODUCE,
            InboundMessage::Step { .. } => event::STEP,
        }
    }

    /// Namespace this message is accepted on
    pub fn namespace(&self) -> Namespace {
        match self {
            InboundMessage::JoinRoom(_) => Namespace::Display,
            InboundMessage::Introduce { .. } | InboundMessage::Step { .. } => Namespace::Accept,
        }
    }
}

/// Server-to-client message
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// Full room list (`status`)
    Rooms(Vec<RoomId>),

    /// Structure snapshot, `None` when the room does not exist (`display`)
    Tree(Option<Structure>),

    /// One step for a joined room (`display`)
    Step(StepEvent),
}

impl OutboundMessage {
    /// Wire event name
    pub fn event_name(&self) -> &'static str {
        match self {
            OutboundMessage::Rooms(_) => event::ROOMS,
            OutboundMessage::Tree(_) => event::TREE,
            OutboundMessage::Step(_) => event::STEP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_round_trip_names() {
        for ns in Namespace::ALL {
            assert_eq!(ns.as_str().parse::<Namespace>(), Ok(ns));
            assert!(ns.path().ends_with(ns.as_str()));
        }
        assert!("admin".parse::<Namespace>().is_err());
    }

    #[test]
    fn test_inbound_namespaces() {
        let room = RoomId::new("r").unwrap();

        assert_eq!(
            InboundMessage::JoinRoom(room.clone()).namespace(),
            Namespace::Display
        );
        let step = InboundMessage::Step {
            step: StepEvent::new(1),
            room: Some(room),
        };
        assert_eq!(step.namespace(), Namespace::Accept);
        assert_eq!(step.event_name(), "step");
    }
}
