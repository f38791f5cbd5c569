//! Relay core
//!
//! [`Relay`] owns all shared state: the room registry, the subscription
//! tables, and one [`Channel`] per connection. Every event is handled to
//! completion by [`Relay::handle`], which returns the deliveries it caused.
//! No I/O happens here, so the whole publish/subscribe contract can be
//! exercised without a network.
//!
//! ```text
//!  RelayEvent ──► Relay::handle ──► Vec<Delivery>
//!                   │                    │
//!                   ├─ RoomRegistry      └─► Relay::resolve(target)
//!                   ├─ SubscriptionManager        │
//!                   └─ Channel per connection     ▼
//!                                          [ConnectionId, ...]
//! ```

pub mod delivery;
pub mod event;

pub use delivery::{Delivery, Target};
pub use event::RelayEvent;

use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use crate::channel::Channel;
use crate::protocol::{InboundMessage, Namespace, OutboundMessage};
use crate::registry::{RegistryConfig, RoomRegistry};
use crate::session::ConnectionId;
use crate::stats::RelayStats;
use crate::subscription::SubscriptionManager;

/// Single owner of all relay state
#[derive(Debug, Default)]
pub struct Relay {
    registry: RoomRegistry,
    subscriptions: SubscriptionManager,
    connections: HashMap<ConnectionId, Channel>,
    status_watchers: BTreeSet<ConnectionId>,
    stats: RelayStats,
}

impl Relay {
    /// Create a relay with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a relay with a custom room lifecycle policy
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            registry: RoomRegistry::with_config(config),
            subscriptions: SubscriptionManager::new(),
            connections: HashMap::new(),
            status_watchers: BTreeSet::new(),
            stats: RelayStats::new(),
        }
    }

    /// Room registry
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Subscription tables
    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    /// Channel attached to `connection`
    pub fn channel(&self, connection: ConnectionId) -> Option<&Channel> {
        self.connections.get(&connection)
    }

    /// Number of attached connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Statistics snapshot
    pub fn stats(&self) -> RelayStats {
        let mut stats = self.stats.clone();
        stats.rooms = self.registry.room_count();
        stats.status_watchers = self.status_watchers.len();
        stats.producers = 0;
        stats.viewers = 0;
        for channel in self.connections.values() {
            match channel {
                Channel::Producer(_) => stats.producers += 1,
                Channel::Viewer(_) => stats.viewers += 1,
                Channel::Status(_) => {}
            }
        }
        stats
    }

    /// Record the outcome of handing one frame to one connection
    pub fn record_delivery(&mut self, delivered: bool) {
        if delivered {
            self.stats.deliveries += 1;
        } else {
            self.stats.dropped_deliveries += 1;
        }
    }

    /// Handle one event to completion
    pub fn handle(&mut self, event: RelayEvent) -> Vec<Delivery> {
        match event {
            RelayEvent::Connected {
                connection,
                namespace,
            } => self.on_connected(connection, namespace),
            RelayEvent::Inbound {
                connection,
                message,
            } => self.on_inbound(connection, message),
            RelayEvent::Disconnected { connection } => self.on_disconnected(connection),
        }
    }

    /// Expand a target into the connections it currently reaches
    pub fn resolve(&self, target: &Target) -> Vec<ConnectionId> {
        match target {
            Target::Connection(connection) if self.connections.contains_key(connection) => {
                vec![*connection]
            }
            Target::Connection(_) => Vec::new(),
            Target::Room(room) => self.subscriptions.members(room),
            Target::StatusWatchers => self.status_watchers.iter().copied().collect(),
        }
    }

    /// Expire orphaned rooms
    pub fn cleanup(&mut self, now: Instant) -> Vec<Delivery> {
        if self.registry.cleanup(now).is_empty() {
            return Vec::new();
        }
        vec![Delivery::new(
            Target::StatusWatchers,
            OutboundMessage::Rooms(self.registry.list_room_ids()),
        )]
    }

    fn on_connected(&mut self, connection: ConnectionId, namespace: Namespace) -> Vec<Delivery> {
        if self.connections.contains_key(&connection) {
            tracing::warn!(connection = %connection, "Duplicate connect ignored");
            return Vec::new();
        }

        let channel = Channel::open(namespace, connection);
        let deliveries = match &channel {
            Channel::Status(status) => {
                self.status_watchers.insert(connection);
                vec![status.on_connect(&self.registry)]
            }
            Channel::Viewer(_) | Channel::Producer(_) => Vec::new(),
        };

        self.connections.insert(connection, channel);
        self.stats.total_connections += 1;

        tracing::debug!(connection = %connection, namespace = %namespace, "Channel opened");
        deliveries
    }

    fn on_inbound(&mut self, connection: ConnectionId, message: InboundMessage) -> Vec<Delivery> {
        let Some(channel) = self.connections.get_mut(&connection) else {
            tracing::debug!(connection = %connection, "Event from unknown connection ignored");
            return Vec::new();
        };

        match (channel, message) {
            (Channel::Viewer(viewer), InboundMessage::JoinRoom(room)) => {
                vec![viewer.on_join(room, &mut self.subscriptions, &self.registry)]
            }
            (Channel::Producer(producer), InboundMessage::Introduce { room, structure }) => {
                self.stats.introduces += 1;
                producer.on_introduce(room, structure, &mut self.registry)
            }
            (Channel::Producer(producer), InboundMessage::Step { step, room }) => {
                self.stats.steps += 1;
                match producer.on_step(step, room) {
                    Some(delivery) => vec![delivery],
                    None => {
                        self.stats.unresolved_steps += 1;
                        tracing::debug!(connection = %connection, "Step with no room dropped");
                        Vec::new()
                    }
                }
            }
            (channel, message) => {
                tracing::debug!(
                    connection = %connection,
                    namespace = %channel.namespace(),
                    event = message.event_name(),
                    "Event not accepted on this channel"
                );
                Vec::new()
            }
        }
    }

    fn on_disconnected(&mut self, connection: ConnectionId) -> Vec<Delivery> {
        let Some(channel) = self.connections.remove(&connection) else {
            return Vec::new();
        };

        tracing::debug!(
            connection = %connection,
            namespace = %channel.namespace(),
            "Channel closed"
        );

        match channel {
            Channel::Status(_) => {
                self.status_watchers.remove(&connection);
                Vec::new()
            }
            Channel::Viewer(mut viewer) => {
                viewer.on_disconnect(&mut self.subscriptions);
                Vec::new()
            }
            Channel::Producer(mut producer) => {
                let config = self.registry.config().clone();
                producer.on_disconnect(&mut self.registry, &config)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::registry::{RoomId, StepEvent, Structure};

    fn room(id: &str) -> RoomId {
        RoomId::new(id).unwrap()
    }

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    /// In-memory bus: handle an event and expand every delivery
    fn dispatch(relay: &mut Relay, event: RelayEvent) -> Vec<(ConnectionId, OutboundMessage)> {
        let deliveries = relay.handle(event);
        deliveries
            .into_iter()
            .flat_map(|delivery| {
                relay
                    .resolve(&delivery.target)
                    .into_iter()
                    .map(move |c| (c, delivery.message.clone()))
            })
            .collect()
    }

    fn connect(relay: &mut Relay, id: u64, namespace: Namespace) -> Vec<(ConnectionId, OutboundMessage)> {
        dispatch(
            relay,
            RelayEvent::Connected {
                connection: conn(id),
                namespace,
            },
        )
    }

    fn send(relay: &mut Relay, id: u64, message: InboundMessage) -> Vec<(ConnectionId, OutboundMessage)> {
        dispatch(
            relay,
            RelayEvent::Inbound {
                connection: conn(id),
                message,
            },
        )
    }

    fn introduce(id: &str, structure: serde_json::Value) -> InboundMessage {
        InboundMessage::Introduce {
            room: room(id),
            structure: Arc::new(structure),
        }
    }

    fn step(step: StepEvent) -> InboundMessage {
        InboundMessage::Step { step, room: None }
    }

    fn tree(structure: serde_json::Value) -> OutboundMessage {
        OutboundMessage::Tree(Some(Structure::new(structure)))
    }

    #[test]
    fn test_scenario_introduce_join_step() {
        let mut relay = Relay::new();

        // Status watcher connected before anything exists
        let out = connect(&mut relay, 10, Namespace::Status);
        assert_eq!(out, vec![(conn(10), OutboundMessage::Rooms(vec![]))]);

        connect(&mut relay, 1, Namespace::Accept);
        let out = send(&mut relay, 1, introduce("treeA", json!({"node": "root"})));
        assert_eq!(
            out,
            vec![(conn(10), OutboundMessage::Rooms(vec![room("treeA")]))]
        );

        connect(&mut relay, 2, Namespace::Display);
        let out = send(&mut relay, 2, InboundMessage::JoinRoom(room("treeA")));
        assert_eq!(out, vec![(conn(2), tree(json!({"node": "root"})))]);

        let out = send(&mut relay, 1, step(StepEvent::new(1).with_value("ok")));
        assert_eq!(
            out,
            vec![(
                conn(2),
                OutboundMessage::Step(StepEvent::new(1).with_value("ok"))
            )]
        );
    }

    #[test]
    fn test_last_write_wins() {
        let mut relay = Relay::new();
        connect(&mut relay, 1, Namespace::Accept);
        connect(&mut relay, 2, Namespace::Accept);
        send(&mut relay, 1, introduce("r", json!("s1")));
        send(&mut relay, 2, introduce("r", json!("s2")));

        connect(&mut relay, 3, Namespace::Display);
        let out = send(&mut relay, 3, InboundMessage::JoinRoom(room("r")));
        assert_eq!(out, vec![(conn(3), tree(json!("s2")))]);
    }

    #[test]
    fn test_join_ghost_room_gets_absent_tree() {
        let mut relay = Relay::new();
        connect(&mut relay, 1, Namespace::Display);

        let out = send(&mut relay, 1, InboundMessage::JoinRoom(room("ghost")));
        assert_eq!(out, vec![(conn(1), OutboundMessage::Tree(None))]);
    }

    #[test]
    fn test_introduce_pushes_tree_to_joined_viewers() {
        let mut relay = Relay::new();
        connect(&mut relay, 1, Namespace::Display);
        send(&mut relay, 1, InboundMessage::JoinRoom(room("early")));

        connect(&mut relay, 2, Namespace::Accept);
        let out = send(&mut relay, 2, introduce("early", json!({"n": 1})));
        assert_eq!(out[0], (conn(1), tree(json!({"n": 1}))));
    }

    #[test]
    fn test_steps_are_room_scoped() {
        let mut relay = Relay::new();
        connect(&mut relay, 1, Namespace::Accept);
        connect(&mut relay, 2, Namespace::Accept);
        send(&mut relay, 1, introduce("r1", json!({})));
        send(&mut relay, 2, introduce("r2", json!({})));

        connect(&mut relay, 11, Namespace::Display);
        connect(&mut relay, 12, Namespace::Display);
        send(&mut relay, 11, InboundMessage::JoinRoom(room("r1")));
        send(&mut relay, 12, InboundMessage::JoinRoom(room("r2")));

        let out = send(&mut relay, 1, step(StepEvent::new("x")));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, conn(11));
    }

    #[test]
    fn test_step_order_preserved() {
        let mut relay = Relay::new();
        connect(&mut relay, 1, Namespace::Accept);
        send(&mut relay, 1, introduce("r", json!({})));
        connect(&mut relay, 2, Namespace::Display);
        send(&mut relay, 2, InboundMessage::JoinRoom(room("r")));

        let mut seen = Vec::new();
        for id in 1..=3 {
            for (_, message) in send(&mut relay, 1, step(StepEvent::new(id))) {
                seen.push(message);
            }
        }

        assert_eq!(
            seen,
            vec![
                OutboundMessage::Step(StepEvent::new(1)),
                OutboundMessage::Step(StepEvent::new(2)),
                OutboundMessage::Step(StepEvent::new(3)),
            ]
        );
    }

    #[test]
    fn test_late_joiner_gets_snapshot_not_history() {
        let mut relay = Relay::new();
        connect(&mut relay, 1, Namespace::Accept);
        send(&mut relay, 1, introduce("r", json!({"n": 1})));
        send(&mut relay, 1, step(StepEvent::new(1)));
        send(&mut relay, 1, step(StepEvent::new(2)));

        connect(&mut relay, 2, Namespace::Display);
        let out = send(&mut relay, 2, InboundMessage::JoinRoom(room("r")));
        assert_eq!(out, vec![(conn(2), tree(json!({"n": 1})))]);
    }

    #[test]
    fn test_status_broadcast_only_for_new_rooms() {
        let mut relay = Relay::new();
        connect(&mut relay, 10, Namespace::Status);
        connect(&mut relay, 11, Namespace::Status);
        connect(&mut relay, 1, Namespace::Accept);

        let out = send(&mut relay, 1, introduce("r", json!(1)));
        let rooms: Vec<_> = out
            .iter()
            .filter(|(_, m)| matches!(m, OutboundMessage::Rooms(_)))
            .collect();
        assert_eq!(rooms.len(), 2);
        assert!(rooms
            .iter()
            .all(|(_, m)| *m == OutboundMessage::Rooms(vec![room("r")])));

        let out = send(&mut relay, 1, introduce("r", json!(2)));
        assert!(out
            .iter()
            .all(|(_, m)| !matches!(m, OutboundMessage::Rooms(_))));
    }

    #[test]
    fn test_unresolved_step_is_noop() {
        let mut relay = Relay::new();
        connect(&mut relay, 1, Namespace::Accept);
        connect(&mut relay, 2, Namespace::Display);
        send(&mut relay, 2, InboundMessage::JoinRoom(room("r")));

        let out = send(&mut relay, 1, step(StepEvent::new(1)));
        assert!(out.is_empty());
        assert_eq!(relay.stats().unresolved_steps, 1);
    }

    #[test]
    fn test_explicit_step_room_overrides_bound_room() {
        let mut relay = Relay::new();
        connect(&mut relay, 1, Namespace::Accept);
        send(&mut relay, 1, introduce("bound", json!({})));
        connect(&mut relay, 2, Namespace::Display);
        send(&mut relay, 2, InboundMessage::JoinRoom(room("other")));

        let out = send(
            &mut relay,
            1,
            InboundMessage::Step {
                step: StepEvent::new(5),
                room: Some(room("other")),
            },
        );
        assert_eq!(out, vec![(conn(2), OutboundMessage::Step(StepEvent::new(5)))]);
    }

    #[test]
    fn test_viewer_disconnect_stops_delivery() {
        let mut relay = Relay::new();
        connect(&mut relay, 1, Namespace::Accept);
        send(&mut relay, 1, introduce("r", json!({})));
        connect(&mut relay, 2, Namespace::Display);
        send(&mut relay, 2, InboundMessage::JoinRoom(room("r")));

        let out = dispatch(&mut relay, RelayEvent::Disconnected { connection: conn(2) });
        assert!(out.is_empty());
        assert!(relay.registry().contains(&room("r")));

        assert!(send(&mut relay, 1, step(StepEvent::new(1))).is_empty());
    }

    #[test]
    fn test_producer_disconnect_keeps_room_by_default() {
        let mut relay = Relay::new();
        connect(&mut relay, 10, Namespace::Status);
        connect(&mut relay, 1, Namespace::Accept);
        send(&mut relay, 1, introduce("r", json!({})));

        let out = dispatch(&mut relay, RelayEvent::Disconnected { connection: conn(1) });
        assert!(out.is_empty());
        assert_eq!(relay.registry().list_room_ids(), vec![room("r")]);
    }

    #[test]
    fn test_producer_disconnect_deletes_room_when_configured() {
        let config = RegistryConfig::default().delete_room_on_producer_disconnect(true);
        let mut relay = Relay::with_config(config);
        connect(&mut relay, 10, Namespace::Status);
        connect(&mut relay, 1, Namespace::Accept);
        send(&mut relay, 1, introduce("r", json!({})));

        let out = dispatch(&mut relay, RelayEvent::Disconnected { connection: conn(1) });
        assert_eq!(out, vec![(conn(10), OutboundMessage::Rooms(vec![]))]);
        assert!(relay.registry().list_room_ids().is_empty());
    }

    #[test]
    fn test_producer_disconnect_deletes_taken_over_room() {
        let config = RegistryConfig::default().delete_room_on_producer_disconnect(true);
        let mut relay = Relay::with_config(config);
        connect(&mut relay, 10, Namespace::Status);
        connect(&mut relay, 1, Namespace::Accept);
        connect(&mut relay, 2, Namespace::Accept);
        send(&mut relay, 1, introduce("r", json!(1)));
        send(&mut relay, 2, introduce("r", json!(2)));

        // The remembered room goes regardless of who introduced it last
        let out = dispatch(&mut relay, RelayEvent::Disconnected { connection: conn(1) });
        assert_eq!(out, vec![(conn(10), OutboundMessage::Rooms(vec![]))]);
        assert!(relay.registry().list_room_ids().is_empty());
    }

    #[test]
    fn test_producer_disconnect_spares_taken_over_room_when_configured() {
        let config = RegistryConfig::default()
            .delete_room_on_producer_disconnect(true)
            .spare_taken_over_rooms(true);
        let mut relay = Relay::with_config(config);
        connect(&mut relay, 10, Namespace::Status);
        connect(&mut relay, 1, Namespace::Accept);
        connect(&mut relay, 2, Namespace::Accept);
        send(&mut relay, 1, introduce("r", json!(1)));
        send(&mut relay, 2, introduce("r", json!(2)));

        let out = dispatch(&mut relay, RelayEvent::Disconnected { connection: conn(1) });
        assert!(out.is_empty());
        assert_eq!(relay.registry().list_room_ids(), vec![room("r")]);

        // The room's own producer still removes it
        let out = dispatch(&mut relay, RelayEvent::Disconnected { connection: conn(2) });
        assert_eq!(out, vec![(conn(10), OutboundMessage::Rooms(vec![]))]);
    }

    #[test]
    fn test_disconnect_without_introduce() {
        for delete in [false, true] {
            let config = RegistryConfig::default().delete_room_on_producer_disconnect(delete);
            let mut relay = Relay::with_config(config);
            connect(&mut relay, 1, Namespace::Accept);

            let out = dispatch(&mut relay, RelayEvent::Disconnected { connection: conn(1) });
            assert!(out.is_empty());
            assert_eq!(relay.connection_count(), 0);
        }
    }

    #[test]
    fn test_wrong_channel_events_ignored() {
        let mut relay = Relay::new();
        connect(&mut relay, 1, Namespace::Display);
        connect(&mut relay, 2, Namespace::Status);

        assert!(send(&mut relay, 1, introduce("r", json!({}))).is_empty());
        assert!(send(&mut relay, 2, InboundMessage::JoinRoom(room("r"))).is_empty());
        assert!(send(&mut relay, 99, InboundMessage::JoinRoom(room("r"))).is_empty());
        assert_eq!(relay.registry().room_count(), 0);
    }

    #[test]
    fn test_disconnected_connection_not_resolved() {
        let mut relay = Relay::new();
        connect(&mut relay, 1, Namespace::Status);
        dispatch(&mut relay, RelayEvent::Disconnected { connection: conn(1) });

        assert!(relay.resolve(&Target::Connection(conn(1))).is_empty());
        assert!(relay.resolve(&Target::StatusWatchers).is_empty());
    }

    #[test]
    fn test_cleanup_broadcasts_room_list() {
        let config = RegistryConfig::default().orphaned_room_ttl(Duration::from_secs(1));
        let mut relay = Relay::with_config(config);
        connect(&mut relay, 1, Namespace::Accept);
        send(&mut relay, 1, introduce("r", json!({})));
        dispatch(&mut relay, RelayEvent::Disconnected { connection: conn(1) });

        assert!(relay.cleanup(Instant::now()).is_empty());

        let deliveries = relay.cleanup(Instant::now() + Duration::from_secs(2));
        assert_eq!(
            deliveries,
            vec![Delivery::new(
                Target::StatusWatchers,
                OutboundMessage::Rooms(vec![])
            )]
        );
    }

    #[test]
    fn test_stats_gauges() {
        let mut relay = Relay::new();
        connect(&mut relay, 1, Namespace::Accept);
        connect(&mut relay, 2, Namespace::Display);
        connect(&mut relay, 3, Namespace::Status);
        send(&mut relay, 1, introduce("r", json!({})));
        send(&mut relay, 1, step(StepEvent::new(1)));
        relay.record_delivery(true);
        relay.record_delivery(false);

        let stats = relay.stats();
        assert_eq!(stats.rooms, 1);
        assert_eq!(stats.producers, 1);
        assert_eq!(stats.viewers, 1);
        assert_eq!(stats.status_watchers, 1);
        assert_eq!(stats.total_connections, 3);
        assert_eq!(stats.introduces, 1);
        assert_eq!(stats.steps, 1);
        assert_eq!(stats.deliveries, 1);
        assert_eq!(stats.dropped_deliveries, 1);
    }
}
