//! Registry error types

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Room ids must be non-empty
    EmptyRoomId,
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::EmptyRoomId => write!(f, "Room id must not be empty"),
        }
    }
}

impl std::error::Error for RegistryError {}
