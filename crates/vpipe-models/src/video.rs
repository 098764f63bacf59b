//! Video identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ModelError, ModelResult};

/// Prefix shared by every tracked video ID.
pub const VIDEO_ID_PREFIX: &str = "VID-";

/// Stable identifier for a tracked video (`VID-####`).
///
/// Assigned once when the row is created in the sheet and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

impl VideoId {
    /// Parse and validate a video ID taken from a sheet cell.
    ///
    /// Surrounding whitespace is ignored; the remainder must be `VID-`
    /// followed by one or more ASCII digits.
    pub fn parse(raw: &str) -> ModelResult<Self> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix(VIDEO_ID_PREFIX)
            .ok_or_else(|| ModelError::InvalidVideoId(raw.to_string()))?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ModelError::InvalidVideoId(raw.to_string()));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Build the canonical ID for a sequence number (`VID-0042`).
    pub fn from_number(n: u32) -> Self {
        Self(format!("{}{:04}", VIDEO_ID_PREFIX, n))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VideoId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VideoId {
    type Error = ModelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<VideoId> for String {
    fn from(id: VideoId) -> Self {
        id.0
    }
}
