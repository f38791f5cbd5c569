//! Error types
//!
//! The real-time path never surfaces errors to clients; these types are used
//! at the edges (startup, decoding, the producer client) and are logged and
//! swallowed everywhere else.

use std::fmt;

use crate::registry::RegistryError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// I/O error (bind, accept, static files)
    Io(std::io::Error),
    /// Malformed wire frame
    Protocol(ProtocolError),
    /// Registry rejected an operation
    Registry(RegistryError),
    /// Invalid configuration value
    Config(String),
    /// WebSocket transport failure on the client side
    Transport(tokio_tungstenite::tungstenite::Error),
    /// Client operation attempted without a live connection
    NotConnected,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Protocol(e) => write!(f, "Protocol error: {}", e),
            Error::Registry(e) => write!(f, "Registry error: {}", e),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Transport(e) => write!(f, "Transport error: {}", e),
            Error::NotConnected => write!(f, "Not connected"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Protocol(e) => Some(e),
            Error::Registry(e) => Some(e),
            Error::Transport(e) => Some(e),
            Error::Config(_) | Error::NotConnected => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::Transport(e)
    }
}

/// Errors produced while decoding or encoding wire frames
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// Frame is not valid JSON
    InvalidJson(String),
    /// Frame is JSON but not a non-empty array starting with an event name
    NotAnEvent,
    /// Event name is not known on any namespace
    UnknownEvent(String),
    /// Event is known but not accepted on this namespace
    UnexpectedEvent {
        namespace: &'static str,
        event: String,
    },
    /// Required positional argument missing
    MissingArgument { event: &'static str, index: usize },
    /// Positional argument has the wrong type
    InvalidArgument {
        event: &'static str,
        index: usize,
        expected: &'static str,
    },
    /// Outbound message could not be serialized
    Encode(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::InvalidJson(msg) => write!(f, "invalid JSON: {}", msg),
            ProtocolError::NotAnEvent => write!(f, "frame is not an event array"),
            ProtocolError::UnknownEvent(event) => write!(f, "unknown event '{}'", event),
            ProtocolError::UnexpectedEvent { namespace, event } => {
                write!(f, "event '{}' not accepted on /{}", event, namespace)
            }
            ProtocolError::MissingArgument { event, index } => {
                write!(f, "event '{}' missing argument {}", event, index)
            }
            ProtocolError::InvalidArgument {
                event,
                index,
                expected,
            } => write!(
                f,
                "event '{}' argument {} must be {}",
                event, index, expected
            ),
            ProtocolError::Encode(msg) => write!(f, "encode failed: {}", msg),
        }
    }
}

impl std::error::Error for ProtocolError {}
