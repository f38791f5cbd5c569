//! Relay-wide counters
//!
//! Owned by the relay and updated from the hub task, so plain integers are
//! enough.

use std::time::{Duration, Instant};

/// Relay-wide statistics
#[derive(Debug, Clone)]
pub struct RelayStats {
    /// Rooms currently in the registry
    pub rooms: usize,
    /// Connected producers
    pub producers: usize,
    /// Connected viewers
    pub viewers: usize,
    /// Connected status watchers
    pub status_watchers: usize,
    /// Total connections ever
    pub total_connections: u64,
    /// Introduce events applied
    pub introduces: u64,
    /// Step events received
    pub steps: u64,
    /// Step events with no resolvable room
    pub unresolved_steps: u64,
    /// Frames handed to a connection outbox
    pub deliveries: u64,
    /// Frames dropped because an outbox was full or closed
    pub dropped_deliveries: u64,
    /// When the relay started
    pub started_at: Instant,
}

impl Default for RelayStats {
    fn default() -> Self {
        Self {
            rooms: 0,
            producers: 0,
            viewers: 0,
            status_watchers: 0,
            total_connections: 0,
            introduces: 0,
            steps: 0,
            unresolved_steps: 0,
            deliveries: 0,
            dropped_deliveries: 0,
            started_at: Instant::now(),
        }
    }
}

impl RelayStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time since the relay started
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Currently connected clients of any kind
    pub fn active_connections(&self) -> usize {
        self.producers + self.viewers + self.status_watchers
    }

    /// Fraction of attempted deliveries that were dropped
    pub fn drop_ratio(&self) -> f64 {
        let attempted = self.deliveries + self.dropped_deliveries;
        if attempted == 0 {
            0.0
        } else {
            self.dropped_deliveries as f64 / attempted as f64
        }
    }
}
