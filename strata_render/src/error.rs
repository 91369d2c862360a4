//! Error types for Strata Render
//!
//! This module defines the single error type used throughout the core,
//! covering device failures, descriptor pool exhaustion and frame validation.

use std::fmt;

/// Result type for Strata Render operations
pub type Result<T> = std::result::Result<T, Error>;

/// Strata Render errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific error (device object creation rejected, lock poisoned, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (null handle, stale handle, missing view, etc.)
    InvalidResource(String),

    /// Initialization failed (device, context, subsystems)
    InitializationFailed(String),

    /// A descriptor pool has no room left for the requested sets
    OutOfPoolMemory,

    /// A descriptor pool has room but is too fragmented to satisfy the request
    FragmentedPool,

    /// Descriptor allocation failed for good (static pool full, or the
    /// dynamic pool failed again after its single retry)
    PoolExhausted(String),

    /// A declared frame failed validation and was not recorded
    ValidationFailed(String),
}

impl Error {
    /// Whether this error is one of the two recoverable pool-capacity results
    /// a device returns from descriptor set allocation
    pub fn is_pool_capacity(&self) -> bool {
        matches!(self, Error::OutOfPoolMemory | Error::FragmentedPool)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::OutOfPoolMemory => write!(f, "Descriptor pool out of memory"),
            Error::FragmentedPool => write!(f, "Descriptor pool fragmented"),
            Error::PoolExhausted(msg) => write!(f, "Descriptor pool exhausted: {}", msg),
            Error::ValidationFailed(msg) => write!(f, "Validation failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
