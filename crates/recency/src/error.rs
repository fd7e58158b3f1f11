//! Error types shared by the recency list and the caches built on it

use std::fmt;

use crate::list::Handle;

/// Result type alias for list and cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by fallible list and cache operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Cache capacity must be at least one entry
    InvalidCapacity(usize),

    /// Handle is stale or belongs to another list
    InvalidHandle(Handle),

    /// A structural invariant does not hold
    Corrupted(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCapacity(capacity) => {
                write!(f, "Invalid capacity: {} (must be greater than 0)", capacity)
            }
            Error::InvalidHandle(handle) => write!(f, "Invalid handle: {:?}", handle),
            Error::Corrupted(msg) => write!(f, "Corrupted structure: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
