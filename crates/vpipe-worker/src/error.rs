//! Worker error types.

use std::time::Duration;

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Poll cycle timed out after {0:?}")]
    CycleTimeout(Duration),

    #[error("Metrics exporter failed: {0}")]
    Metrics(String),

    #[error("Monitor error: {0}")]
    Monitor(#[from] vpipe_monitor::MonitorError),

    #[error("Sheets error: {0}")]
    Sheets(#[from] vpipe_sheets::SheetsError),

    #[error("Telegram error: {0}")]
    Telegram(#[from] vpipe_telegram::TelegramError),

    #[error("Queue error: {0}")]
    Queue(#[from] vpipe_queue::QueueError),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether the next tick may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::CycleTimeout(_) => true,
            WorkerError::Monitor(e) => e.is_retryable(),
            WorkerError::Sheets(e) => e.is_retryable(),
            WorkerError::Telegram(e) => e.is_retryable(),
            WorkerError::Queue(e) => e.is_retryable(),
            WorkerError::ConfigError(_) | WorkerError::Metrics(_) => false,
        }
    }
}
