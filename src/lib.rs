//! Real-time relay for tree-structured execution traces
//!
//! Producers introduce a tree under a room id and then stream execution
//! steps into it. Viewers join rooms by id and receive the current tree
//! followed by every step. Status watchers receive the list of rooms each
//! time a new one appears.
//!
//! Clients speak JSON-array events over three WebSocket endpoints:
//!
//! | Endpoint       | Role            | Sends                 | Receives        |
//! |----------------|-----------------|-----------------------|-----------------|
//! | `/ws/status`   | status watcher  |                       | `rooms`         |
//! | `/ws/display`  | viewer          | `join room`           | `tree`, `step`  |
//! | `/ws/accept`   | producer        | `introduce`, `step`   |                 |
//!
//! # Example
//! ```no_run
//! use tree_relay::{RegistryConfig, RelayServer, ServerConfig};
//!
//! # async fn example() -> tree_relay::Result<()> {
//! let config = ServerConfig::default().max_connections(1000);
//! let registry = RegistryConfig::default().delete_room_on_producer_disconnect(true);
//!
//! RelayServer::with_registry_config(config, registry).run().await
//! # }
//! ```
//!
//! The routing core ([`Relay`]) is a plain state machine and can be driven
//! without any networking; the server wraps it in a single hub task.

pub mod channel;
pub mod client;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod server;
pub mod session;
pub mod stats;
pub mod subscription;

pub use client::{ProducerConfig, TraceProducer};
pub use error::{Error, Result};
pub use registry::{RegistryConfig, RoomId, StepEvent};
pub use relay::Relay;
pub use server::{RelayServer, ServerConfig};
pub use stats::RelayStats;
