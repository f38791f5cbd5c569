//! Per-connection session context

pub mod context;

pub use context::{ConnectionId, SessionContext};
