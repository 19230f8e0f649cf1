//! Error types for the DDNS system
//!
//! Fetch and update failures are separate enums so the engine can tell which
//! half of a reconcile cycle went wrong. None of them is fatal: the engine
//! logs them and moves on to the next cycle.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to read the managed record from the registrar
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network or connection failure, including non-2xx HTTP statuses
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body was malformed or missing required fields
    #[error("parse error: {0}")]
    Parse(String),

    /// Well-formed response carrying a non-success reply code
    #[error("registrar rejected request, code: {code}, detail: {detail}")]
    RemoteRejected { code: u32, detail: String },

    /// The record list contained no entry for the target host
    #[error("target host not found: {target}")]
    HostNotFound { target: String },
}

impl FetchError {
    /// Whether another attempt within the same cycle could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transport(_))
    }
}

/// Failure to push a new value into the managed record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    /// Network or connection failure, including non-2xx HTTP statuses
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body was malformed or missing required fields
    #[error("parse error: {0}")]
    Parse(String),

    /// Well-formed response carrying a non-success reply code
    #[error("registrar rejected update, code: {code}, detail: {detail}")]
    RemoteRejected { code: u32, detail: String },
}

impl UpdateError {
    /// Whether another attempt within the same cycle could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, UpdateError::Transport(_))
    }
}

/// Core error type for the DDNS system
///
/// Only construction-time problems surface here. Per-cycle failures are
/// reported through `CycleOutcome` and never abort the loop.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
