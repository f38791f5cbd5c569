//! Registry configuration

use std::time::Duration;

use crate::error::{Error, Result};

/// Room lifecycle policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Remove a producer's remembered room when the producer disconnects
    pub delete_room_on_producer_disconnect: bool,

    /// With deletion enabled, keep the room if a later producer introduced it
    pub spare_taken_over_rooms: bool,

    /// Remove rooms that have had no connected producer for this long
    pub orphaned_room_ttl: Option<Duration>,

    /// How often the hub runs cleanup
    pub cleanup_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            delete_room_on_producer_disconnect: false,
            spare_taken_over_rooms: false,
            orphaned_room_ttl: None,
            cleanup_interval: Duration::from_secs(30),
        }
    }
}

impl RegistryConfig {
    /// Set the producer-disconnect policy
    pub fn delete_room_on_producer_disconnect(mut self, delete: bool) -> Self {
        self.delete_room_on_producer_disconnect = delete;
        self
    }

    /// Only delete a room on disconnect while the producer still owns it
    pub fn spare_taken_over_rooms(mut self, spare: bool) -> Self {
        self.spare_taken_over_rooms = spare;
        self
    }

    /// Expire rooms without a producer after `ttl`
    pub fn orphaned_room_ttl(mut self, ttl: Duration) -> Self {
        self.orphaned_room_ttl = Some(ttl);
        self
    }

    /// Set the cleanup interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Build from process environment
    ///
    /// Reads `TREE_RELAY_DELETE_ROOM_ON_DISCONNECT`,
    /// `TREE_RELAY_SPARE_TAKEN_OVER_ROOMS` and `TREE_RELAY_ORPHAN_TTL_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("TREE_RELAY_DELETE_ROOM_ON_DISCONNECT") {
            config.delete_room_on_producer_disconnect = parse_flag(&raw).ok_or_else(|| {
                Error::Config(format!(
                    "TREE_RELAY_DELETE_ROOM_ON_DISCONNECT: expected a boolean, got '{}'",
                    raw
                ))
            })?;
        }

        if let Some(raw) = lookup("TREE_RELAY_SPARE_TAKEN_OVER_ROOMS") {
            config.spare_taken_over_rooms = parse_flag(&raw).ok_or_else(|| {
                Error::Config(format!(
                    "TREE_RELAY_SPARE_TAKEN_OVER_ROOMS: expected a boolean, got '{}'",
                    raw
                ))
            })?;
        }

        if let Some(raw) = lookup("TREE_RELAY_ORPHAN_TTL_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "TREE_RELAY_ORPHAN_TTL_SECS: expected seconds, got '{}'",
                    raw
                ))
            })?;
            config.orphaned_room_ttl = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

pub(crate) fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
