//! Audio backend error types

use thiserror::Error;

/// Errors reported by a hardware audio backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend never came up or has been shut down
    #[error("Audio backend is not running")]
    NotRunning,

    /// Failed to open a client on the audio server
    #[error("Failed to open client '{name}': {reason}")]
    ClientOpen { name: String, reason: String },

    /// Failed to activate the client's process callback
    #[error("Failed to activate client: {0}")]
    Activation(String),

    /// Failed to register a port
    #[error("Failed to register port '{name}': {reason}")]
    PortRegister { name: String, reason: String },

    /// Port name already taken by another port of this client
    #[error("Port name already in use: {0}")]
    DuplicatePort(String),

    /// Rename rejected by the backend (non-fatal, previous name stays)
    #[error("Failed to rename port to '{name}': {reason}")]
    PortRename { name: String, reason: String },

    /// Failed to release a port
    #[error("Failed to unregister port '{name}': {reason}")]
    PortUnregister { name: String, reason: String },
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;
