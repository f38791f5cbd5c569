//! Relay server
//!
//! Accepts WebSocket clients, routes their events through the hub and serves
//! the static viewer pages.

pub mod config;
pub(crate) mod connection;
pub(crate) mod http;
pub mod hub;
pub mod listener;

pub use config::ServerConfig;
pub use hub::{Hub, HubCommand, HubHandle};
pub use listener::RelayServer;
