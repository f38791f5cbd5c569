//! Producer client configuration

use std::time::Duration;

use crate::protocol::Namespace;
use crate::registry::{RegistryError, RoomId};

/// Producer client configuration
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Relay base URL, e.g. `ws://localhost:3000`
    pub url: String,

    /// Room to publish under (derived from host and program name if unset)
    pub room: Option<RoomId>,

    /// Idle time after which the next step reconnects and re-introduces
    pub reconnect_after: Duration,
}

impl ProducerConfig {
    /// Create a config for the relay at `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            room: None,
            reconnect_after: Duration::from_secs(30),
        }
    }

    /// Publish under a specific room
    pub fn room(mut self, room: RoomId) -> Self {
        self.room = Some(room);
        self
    }

    /// Set the idle reconnect threshold
    pub fn reconnect_after(mut self, idle: Duration) -> Self {
        self.reconnect_after = idle;
        self
    }

    /// WebSocket endpoint for producers
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), Namespace::Accept.path())
    }

    /// Room id to publish under
    pub fn room_id(&self) -> Result<RoomId, RegistryError> {
        match &self.room {
            Some(room) => Ok(room.clone()),
            None => RoomId::new(default_room_name()),
        }
    }
}

/// Room name derived from the host name and the running program
pub fn default_room_name() -> String {
    let host = std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "localhost".into());
    let program = std::env::args().next().unwrap_or_else(|| "producer".into());

    sanitize_room_name(&format!("{}-{}", host, program))
}

/// Collapse every run of characters outside `[0-9A-Za-z/]` into one `-`
pub fn sanitize_room_name(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len());
    let mut in_run = false;

    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || c == '/' {
            name.push(c);
            in_run = false;
        } else if !in_run {
            name.push('-');
            in_run = true;
        }
    }

    name
}
