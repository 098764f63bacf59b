//! Queue error types.

use thiserror::Error;

use vpipe_monitor::CollaboratorError;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Enqueue failed: {0}")]
    EnqueueFailed(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QueueError {
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed(msg.into())
    }

    pub fn enqueue_failed(msg: impl Into<String>) -> Self {
        Self::EnqueueFailed(msg.into())
    }

    /// Connection-level failures may clear up by the next cycle.
    pub fn is_retryable(&self) -> bool {
        match self {
            QueueError::ConnectionFailed(_) => true,
            QueueError::Redis(e) => e.is_io_error() || e.is_timeout() || e.is_connection_dropped(),
            _ => false,
        }
    }

    pub fn into_workflow_error(self) -> CollaboratorError {
        let retryable = self.is_retryable();
        CollaboratorError::workflow(self.to_string()).retryable(retryable)
    }

    pub fn into_store_error(self) -> CollaboratorError {
        let retryable = self.is_retryable();
        CollaboratorError::snapshot_store(self.to_string()).retryable(retryable)
    }
}
