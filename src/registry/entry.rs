//! Room entry and state types
//!
//! This module defines the per-room state stored in the registry.

use std::time::{Duration, Instant};

use crate::session::ConnectionId;

use super::frame::Structure;

/// State of a room entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    /// The producer that last introduced the room is still connected
    Live,
    /// That producer disconnected and the room was retained
    Orphaned,
}

/// Entry for a single room in the registry
#[derive(Debug, Clone)]
pub struct RoomEntry {
    /// Latest structure snapshot
    pub structure: Structure,

    /// Connection that last introduced this room (None once it disconnects)
    pub producer: Option<ConnectionId>,

    /// Number of introduces applied to this room
    pub revision: u64,

    /// When the room was created
    pub created_at: Instant,

    /// When the structure was last replaced
    pub updated_at: Instant,

    /// When the producer disconnected (for orphan expiry)
    pub orphaned_at: Option<Instant>,
}

impl RoomEntry {
    pub(super) fn new(structure: Structure, producer: ConnectionId, now: Instant) -> Self {
        Self {
            structure,
            producer: Some(producer),
            revision: 1,
            created_at: now,
            updated_at: now,
            orphaned_at: None,
        }
    }

    /// Overwrite the structure and take ownership for `producer`
    pub(super) fn replace(&mut self, structure: Structure, producer: ConnectionId, now: Instant) {
        self.structure = structure;
        self.producer = Some(producer);
        self.revision += 1;
        self.updated_at = now;
        self.orphaned_at = None;
    }

    /// Mark the producer as gone
    pub(super) fn orphan(&mut self, now: Instant) {
        self.producer = None;
        self.orphaned_at = Some(now);
    }

    /// Current lifecycle state
    pub fn state(&self) -> RoomState {
        if self.producer.is_some() {
            RoomState::Live
        } else {
            RoomState::Orphaned
        }
    }

    /// Whether the room has been orphaned for longer than `ttl`
    pub fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        match self.orphaned_at {
            Some(at) => now.duration_since(at) > ttl,
            None => false,
        }
    }
}

/// Statistics for a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomStats {
    /// Current lifecycle state
    pub state: RoomState,
    /// Connection currently owning the room
    pub producer: Option<ConnectionId>,
    /// Number of introduces applied
    pub revision: u64,
}
