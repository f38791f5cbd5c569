//! Room registry
//!
//! The registry maps room ids to the latest structure introduced for that
//! room. It is the only place that knows which rooms exist.
//!
//! # Architecture
//!
//! ```text
//!                          Relay (hub task)
//!                     ┌─────────────────────────┐
//!                     │ rooms: BTreeMap<RoomId, │
//!                     │   RoomEntry {           │
//!                     │     structure,          │
//!                     │     producer,           │
//!                     │   }                     │
//!                     │ >                       │
//!                     └───────────┬─────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!    [Producer]               [Viewer]            [Status watcher]
//!    introduce()           get_structure()        list_room_ids()
//! ```
//!
//! Structures are `Arc`-shared, so handing a snapshot to a joining viewer
//! only bumps a reference count.

pub mod config;
pub mod entry;
pub mod error;
pub mod frame;
pub mod store;

pub use config::RegistryConfig;
pub use entry::{RoomEntry, RoomState, RoomStats};
pub use error::RegistryError;
pub use frame::{RoomId, StepEvent, Structure};
pub use store::{Introduced, RoomRegistry};
