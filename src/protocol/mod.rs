//! Wire protocol
//!
//! Clients talk to the relay over one WebSocket per namespace. Each text
//! message carries a single event encoded as a JSON array:
//!
//! ```text
//! /ws/status   <- ["rooms", ["treeA", "treeB"]]
//! /ws/display  -> ["join room", "treeA"]
//!              <- ["tree", {...}] | ["tree", null]
//!              <- ["step", stepId] | ["step", stepId, value]
//! /ws/accept   -> ["introduce", "treeA", {...}]
//!              -> ["step", stepId, value?, roomId?]
//! ```

pub mod codec;
pub mod message;

pub use codec::{decode, decode_outbound, encode, encode_inbound};
pub use message::{event, InboundMessage, Namespace, OutboundMessage};
