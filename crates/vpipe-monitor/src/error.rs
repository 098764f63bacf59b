//! Monitor error types.

use thiserror::Error;

use crate::collaborators::CollaboratorError;

/// Result type for monitor operations.
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors that end a poll cycle before any action runs.
///
/// Action failures never surface here; they are recorded per action in the
/// dispatch results.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Snapshot fetch failed: {0}")]
    Fetch(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

impl MonitorError {
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Fetch failures are transient by nature: the next cycle tries again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MonitorError::Fetch(_)) || matches!(self, MonitorError::Collaborator(e) if e.retryable)
    }
}
