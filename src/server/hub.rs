//! Hub task
//!
//! The hub is the only task that touches the [`Relay`]. Connection tasks send
//! it commands over an unbounded channel and receive encoded frames through
//! their own bounded outbox. Commands are processed strictly one at a time,
//! in arrival order, so handlers never run concurrently.
//!
//! ```text
//!  [conn task] ──HubCommand──┐
//!  [conn task] ──HubCommand──┼──► Hub { Relay } ──Bytes──► outbox ──► [conn task] ──► WS
//!  [conn task] ──HubCommand──┘
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::protocol::{self, InboundMessage};
use crate::registry::RegistryConfig;
use crate::relay::{Delivery, Relay, RelayEvent};
use crate::session::{ConnectionId, SessionContext};
use crate::stats::RelayStats;

/// Shortest tick accepted for the cleanup and stats timers
const MIN_TICK: Duration = Duration::from_millis(10);

/// Commands accepted by the hub
#[derive(Debug)]
pub enum HubCommand {
    /// Register a connection and its outbox
    Attach {
        context: SessionContext,
        outbox: mpsc::Sender<Bytes>,
    },
    /// A decoded frame from a connection
    Inbound {
        connection: ConnectionId,
        message: InboundMessage,
    },
    /// The connection closed
    Detach { connection: ConnectionId },
    /// Request a stats snapshot
    Stats { reply: oneshot::Sender<RelayStats> },
}

/// Cloneable handle used by connection tasks
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: mpsc::UnboundedSender<HubCommand>,
    next_connection_id: Arc<AtomicU64>,
}

impl HubHandle {
    /// Allocate a fresh connection id
    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId::new(self.next_connection_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a connection; `false` if the hub has stopped
    pub fn attach(&self, context: SessionContext, outbox: mpsc::Sender<Bytes>) -> bool {
        self.tx.send(HubCommand::Attach { context, outbox }).is_ok()
    }

    /// Forward a decoded frame; `false` if the hub has stopped
    pub fn inbound(&self, connection: ConnectionId, message: InboundMessage) -> bool {
        self.tx
            .send(HubCommand::Inbound {
                connection,
                message,
            })
            .is_ok()
    }

    /// Report a closed connection
    pub fn detach(&self, connection: ConnectionId) {
        let _ = self.tx.send(HubCommand::Detach { connection });
    }

    /// Stats snapshot, `None` if the hub has stopped
    pub async fn stats(&self) -> Option<RelayStats> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(HubCommand::Stats { reply }).ok()?;
        rx.await.ok()
    }
}

/// Owner of the relay state and every connection outbox
pub struct Hub {
    relay: Relay,
    outboxes: HashMap<ConnectionId, mpsc::Sender<Bytes>>,
    rx: mpsc::UnboundedReceiver<HubCommand>,
    cleanup_interval: Duration,
    stats_interval: Duration,
}

impl Hub {
    /// Create a hub and its handle
    ///
    /// The hub stops once every handle has been dropped.
    pub fn new(registry_config: RegistryConfig, stats_interval: Duration) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let cleanup_interval = registry_config.cleanup_interval;

        let hub = Self {
            relay: Relay::with_config(registry_config),
            outboxes: HashMap::new(),
            rx,
            cleanup_interval,
            stats_interval,
        };
        let handle = HubHandle {
            tx,
            next_connection_id: Arc::new(AtomicU64::new(1)),
        };

        (hub, handle)
    }

    /// Spawn the hub onto the runtime
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process commands until every handle is gone
    pub async fn run(mut self) {
        let mut cleanup = tokio::time::interval(self.cleanup_interval.max(MIN_TICK));
        cleanup.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stats = tokio::time::interval(self.stats_interval.max(MIN_TICK));
        stats.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = self.rx.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },
                _ = cleanup.tick() => {
                    let deliveries = self.relay.cleanup(Instant::now());
                    self.dispatch(deliveries);
                }
                _ = stats.tick() => {
                    let stats = self.relay.stats();
                    tracing::debug!(
                        rooms = stats.rooms,
                        producers = stats.producers,
                        viewers = stats.viewers,
                        status_watchers = stats.status_watchers,
                        deliveries = stats.deliveries,
                        dropped = stats.dropped_deliveries,
                        "Relay stats"
                    );
                }
            }
        }

        tracing::debug!("Hub stopped");
    }

    fn apply(&mut self, command: HubCommand) {
        let deliveries = match command {
            HubCommand::Attach { context, outbox } => {
                let connection = context.connection_id;
                self.outboxes.insert(connection, outbox);
                tracing::info!(
                    connection = %connection,
                    peer = %context.peer_addr,
                    namespace = %context.namespace,
                    "Client connected"
                );
                self.relay.handle(RelayEvent::Connected {
                    connection,
                    namespace: context.namespace,
                })
            }
            HubCommand::Inbound {
                connection,
                message,
            } => self.relay.handle(RelayEvent::Inbound {
                connection,
                message,
            }),
            HubCommand::Detach { connection } => {
                self.outboxes.remove(&connection);
                tracing::info!(connection = %connection, "Client disconnected");
                self.relay.handle(RelayEvent::Disconnected { connection })
            }
            HubCommand::Stats { reply } => {
                let _ = reply.send(self.relay.stats());
                Vec::new()
            }
        };

        self.dispatch(deliveries);
    }

    /// Encode each delivery once and hand it to every resolved outbox
    fn dispatch(&mut self, deliveries: Vec<Delivery>) {
        for delivery in deliveries {
            let frame = match protocol::encode(&delivery.message) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping unencodable frame");
                    continue;
                }
            };

            for connection in self.relay.resolve(&delivery.target) {
                let Some(outbox) = self.outboxes.get(&connection) else {
                    continue;
                };

                let delivered = match outbox.try_send(frame.clone()) {
                    Ok(()) => true,
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(
                            connection = %connection,
                            event = delivery.message.event_name(),
                            "Outbox full, frame dropped"
                        );
                        false
                    }
                    Err(TrySendError::Closed(_)) => false,
                };
                self.relay.record_delivery(delivered);
            }
        }
    }
}
