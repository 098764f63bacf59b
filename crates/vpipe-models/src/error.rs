//! Model validation errors.

use thiserror::Error;

/// Result type for model parsing and validation.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while parsing sheet values into typed models.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Invalid video ID '{0}': expected VID-<digits>")]
    InvalidVideoId(String),

    #[error("Unknown {field} value: '{value}'")]
    UnknownStatus { field: &'static str, value: String },
}

impl ModelError {
    pub fn unknown_status(field: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownStatus {
            field,
            value: value.into(),
        }
    }
}
