//! Room identifiers and the payloads routed through a room
//!
//! Both payload kinds are opaque to the relay. Structures are shared behind
//! an `Arc` so that handing the current snapshot to a joining viewer never
//! copies the document.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::error::RegistryError;

/// Unique identifier for a room
///
/// Any non-empty string is accepted; the relay never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoomId(String);

impl RoomId {
    /// Create a room id, rejecting the empty string
    pub fn new(id: impl Into<String>) -> Result<Self, RegistryError> {
        let id = id.into();
        if id.is_empty() {
            return Err(RegistryError::EmptyRoomId);
        }
        Ok(Self(id))
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RoomId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Producer-supplied tree document, replaced wholesale on every introduce
pub type Structure = Arc<Value>;

/// One execution step within a room's trace
///
/// Transient: delivered to the room's current subscribers and dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct StepEvent {
    /// Opaque step identifier (usually the id of the node being entered)
    pub step_id: Value,
    /// Optional value yielded by the step
    pub value: Option<Value>,
}

impl StepEvent {
    /// Create a step event without a value
    pub fn new(step_id: impl Into<Value>) -> Self {
        Self {
            step_id: step_id.into(),
            value: None,
        }
    }

    /// Attach a yielded value
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }
}
