//! Crate-level error type

use thiserror::Error;

use crate::audio::BackendError;

/// Errors returned by bridge operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The hardware backend rejected an operation
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Port lane outside 0..8
    #[error("Lane index out of range: {0} (instances have 8 ports)")]
    InvalidLane(usize),

    /// The port name generator could not be built from the configured salt
    #[error("Failed to build port name generator: {0}")]
    Naming(String),
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
