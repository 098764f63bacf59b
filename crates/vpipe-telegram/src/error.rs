//! Telegram error types.

use thiserror::Error;

use vpipe_monitor::CollaboratorError;

pub type TelegramResult<T> = Result<T, TelegramError>;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Telegram API error {code}: {description}")]
    Api { code: u16, description: String },

    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TelegramError {
    pub fn api(code: u16, description: impl Into<String>) -> Self {
        Self::Api {
            code,
            description: description.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            TelegramError::RateLimited(_) | TelegramError::Network(_) => true,
            TelegramError::Api { code, .. } => *code >= 500,
            _ => false,
        }
    }
}

impl From<TelegramError> for CollaboratorError {
    fn from(e: TelegramError) -> Self {
        let retryable = e.is_retryable();
        CollaboratorError::notification(e.to_string()).retryable(retryable)
    }
}
