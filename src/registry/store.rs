//! Room registry implementation
//!
//! The single source of truth for which rooms exist and what their current
//! structure is. The registry is owned by exactly one [`Relay`] and is only
//! touched from the hub task, so it takes `&mut self` and needs no locking.
//!
//! [`Relay`]: crate::relay::Relay

use std::collections::BTreeMap;
use std::time::Instant;

use crate::session::ConnectionId;

use super::config::RegistryConfig;
use super::entry::{RoomEntry, RoomStats};
use super::frame::{RoomId, Structure};

/// Outcome of an introduce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Introduced {
    /// The room did not exist before; the room index changed
    Created,
    /// An existing room's structure was overwritten
    Replaced,
}

impl Introduced {
    /// Whether the set of room ids changed
    pub fn is_new_room(self) -> bool {
        self == Introduced::Created
    }
}

/// Registry of all rooms
///
/// Keys are kept in a `BTreeMap`, so [`list_room_ids`](Self::list_room_ids)
/// is sorted and stable across calls.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Map of room id to room entry
    rooms: BTreeMap<RoomId, RoomEntry>,

    /// Configuration
    config: RegistryConfig,
}

impl RoomRegistry {
    /// Create a new room registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new room registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            rooms: BTreeMap::new(),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Create or replace a room's structure
    ///
    /// Last write wins: the structure is replaced wholesale and `producer`
    /// becomes the room's owner.
    pub fn introduce(
        &mut self,
        room: RoomId,
        structure: Structure,
        producer: ConnectionId,
    ) -> Introduced {
        let now = Instant::now();

        if let Some(entry) = self.rooms.get_mut(&room) {
            if entry.producer.is_some_and(|owner| owner != producer) {
                tracing::debug!(
                    room = %room,
                    previous = ?entry.producer,
                    producer = %producer,
                    "Room taken over by another producer"
                );
            }
            entry.replace(structure, producer, now);

            tracing::debug!(
                room = %room,
                producer = %producer,
                revision = entry.revision,
                "Room structure replaced"
            );
            Introduced::Replaced
        } else {
            tracing::info!(room = %room, producer = %producer, "Room created");
            self.rooms
                .insert(room, RoomEntry::new(structure, producer, now));
            Introduced::Created
        }
    }

    /// Current structure of a room, or `None` if the room does not exist
    pub fn get_structure(&self, room: &RoomId) -> Option<Structure> {
        self.rooms.get(room).map(|entry| entry.structure.clone())
    }

    /// Delete a room
    ///
    /// Returns `true` if the room existed.
    pub fn remove(&mut self, room: &RoomId) -> bool {
        let removed = self.rooms.remove(room).is_some();
        if removed {
            tracing::info!(room = %room, "Room removed");
        }
        removed
    }

    /// Delete a room only if `producer` still owns it
    pub fn remove_owned(&mut self, room: &RoomId, producer: ConnectionId) -> bool {
        match self.rooms.get(room) {
            Some(entry) if entry.producer == Some(producer) => self.remove(room),
            Some(entry) => {
                tracing::debug!(
                    room = %room,
                    owner = ?entry.producer,
                    producer = %producer,
                    "Room not removed, owned by another producer"
                );
                false
            }
            None => false,
        }
    }

    /// Mark every room owned by `producer` as orphaned
    ///
    /// Returns the affected room ids.
    pub fn release_producer(&mut self, producer: ConnectionId) -> Vec<RoomId> {
        let now = Instant::now();
        let mut released = Vec::new();

        for (room, entry) in self.rooms.iter_mut() {
            if entry.producer == Some(producer) {
                entry.orphan(now);
                released.push(room.clone());
            }
        }

        released
    }

    /// Snapshot of current room ids
    pub fn list_room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().cloned().collect()
    }

    /// Check if a room exists
    pub fn contains(&self, room: &RoomId) -> bool {
        self.rooms.contains_key(room)
    }

    /// Get total number of rooms
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Get room statistics
    pub fn room_stats(&self, room: &RoomId) -> Option<RoomStats> {
        self.rooms.get(room).map(|entry| RoomStats {
            state: entry.state(),
            producer: entry.producer,
            revision: entry.revision,
        })
    }

    /// Run cleanup once
    ///
    /// Removes rooms orphaned longer than `orphaned_room_ttl`. Returns the
    /// removed ids; a no-op when no TTL is configured.
    pub fn cleanup(&mut self, now: Instant) -> Vec<RoomId> {
        let Some(ttl) = self.config.orphaned_room_ttl else {
            return Vec::new();
        };

        let expired: Vec<RoomId> = self
            .rooms
            .iter()
            .filter(|(_, entry)| entry.is_expired(ttl, now))
            .map(|(room, _)| room.clone())
            .collect();

        for room in &expired {
            self.rooms.remove(room);
            tracing::info!(room = %room, "Room removed by cleanup");
        }

        expired
    }
}
