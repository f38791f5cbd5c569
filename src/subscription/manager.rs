//! Room membership tables
//!
//! Two indexes are kept in sync: room -> members for fan-out, and
//! connection -> rooms for disconnect cleanup. Membership only changes
//! through [`SubscriptionManager::join`] and
//! [`SubscriptionManager::on_disconnect`].

use std::collections::{BTreeSet, HashMap};

use crate::registry::RoomId;
use crate::session::ConnectionId;

/// Tracks which viewer connections belong to which room group
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    groups: HashMap<RoomId, BTreeSet<ConnectionId>>,
    memberships: HashMap<ConnectionId, BTreeSet<RoomId>>,
}

impl SubscriptionManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `connection` to `room`'s group
    ///
    /// Idempotent. Earlier memberships are kept, so a viewer that joins
    /// several rooms receives events for all of them. Returns `true` if the
    /// membership is new.
    pub fn join(&mut self, connection: ConnectionId, room: &RoomId) -> bool {
        let added = self
            .groups
            .entry(room.clone())
            .or_default()
            .insert(connection);

        if added {
            self.memberships
                .entry(connection)
                .or_default()
                .insert(room.clone());

            tracing::debug!(
                connection = %connection,
                room = %room,
                subscribers = self.subscriber_count(room),
                "Subscriber added"
            );
        }

        added
    }

    /// Current members of `room`, in connection id order
    pub fn members(&self, room: &RoomId) -> Vec<ConnectionId> {
        self.groups
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Rooms `connection` is joined to
    pub fn rooms_of(&self, connection: ConnectionId) -> Vec<RoomId> {
        self.memberships
            .get(&connection)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether `connection` is joined to `room`
    pub fn is_member(&self, connection: ConnectionId, room: &RoomId) -> bool {
        self.groups
            .get(room)
            .is_some_and(|members| members.contains(&connection))
    }

    /// Number of viewers joined to `room`
    pub fn subscriber_count(&self, room: &RoomId) -> usize {
        self.groups.get(room).map_or(0, BTreeSet::len)
    }

    /// Number of distinct connections with at least one membership
    pub fn viewer_count(&self) -> usize {
        self.memberships.len()
    }

    /// Drop every membership of `connection`
    ///
    /// Rooms themselves are unaffected. Returns the number of memberships
    /// removed.
    pub fn on_disconnect(&mut self, connection: ConnectionId) -> usize {
        let Some(rooms) = self.memberships.remove(&connection) else {
            return 0;
        };

        for room in &rooms {
            if let Some(members) = self.groups.get_mut(room) {
                members.remove(&connection);
                if members.is_empty() {
                    self.groups.remove(room);
                }
            }
        }

        tracing::debug!(
            connection = %connection,
            rooms = rooms.len(),
            "Subscriber removed"
        );

        rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str) -> RoomId {
        RoomId::new(id).unwrap()
    }

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    #[test]
    fn test_join_is_idempotent() {
        let mut subs = SubscriptionManager::new();

        assert!(subs.join(conn(1), &room("a")));
        assert!(!subs.join(conn(1), &room("a")));

        assert_eq!(subs.members(&room("a")), vec![conn(1)]);
        assert_eq!(subs.subscriber_count(&room("a")), 1);
    }

    #[test]
    fn test_members_are_room_scoped() {
        let mut subs = SubscriptionManager::new();
        subs.join(conn(1), &room("r1"));
        subs.join(conn(2), &room("r2"));
        subs.join(conn(3), &room("r1"));

        assert_eq!(subs.members(&room("r1")), vec![conn(1), conn(3)]);
        assert_eq!(subs.members(&room("r2")), vec![conn(2)]);
        assert!(subs.members(&room("r3")).is_empty());
        assert!(!subs.is_member(conn(2), &room("r1")));
    }

    #[test]
    fn test_multiple_joins_accumulate() {
        let mut subs = SubscriptionManager::new();
        subs.join(conn(1), &room("a"));
        subs.join(conn(1), &room("b"));

        assert_eq!(subs.rooms_of(conn(1)), vec![room("a"), room("b")]);
        assert!(subs.is_member(conn(1), &room("a")));
        assert!(subs.is_member(conn(1), &room("b")));
        assert_eq!(subs.viewer_count(), 1);
    }

    #[test]
    fn test_disconnect_removes_all_memberships() {
        let mut subs = SubscriptionManager::new();
        subs.join(conn(1), &room("a"));
        subs.join(conn(1), &room("b"));
        subs.join(conn(2), &room("a"));

        assert_eq!(subs.on_disconnect(conn(1)), 2);
        assert_eq!(subs.members(&room("a")), vec![conn(2)]);
        assert!(subs.members(&room("b")).is_empty());
        assert!(subs.rooms_of(conn(1)).is_empty());

        // Second disconnect is a no-op
        assert_eq!(subs.on_disconnect(conn(1)), 0);
    }
}
