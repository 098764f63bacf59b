//! Monitored status fields and their sheet vocabularies.
//!
//! The sheet is edited by hand, so cells are kept as raw [`FieldValue`]s and
//! only interpreted through the typed enums where a rule needs a specific
//! value. An unknown label is still a value: it diffs like any other string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

// =============================================================================
// Field names
// =============================================================================

/// The closed set of status columns the monitor compares.
///
/// Declaration order is the comparison order and the dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusField {
    MainStatus,
    ScriptApproved,
    VoiceGenerationStatus,
    VideoEditingStatus,
}

impl StatusField {
    /// Every monitored field, in comparison order.
    pub const ALL: [StatusField; 4] = [
        StatusField::MainStatus,
        StatusField::ScriptApproved,
        StatusField::VoiceGenerationStatus,
        StatusField::VideoEditingStatus,
    ];

    /// Stable key used in logs and change reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusField::MainStatus => "mainStatus",
            StatusField::ScriptApproved => "scriptApproved",
            StatusField::VoiceGenerationStatus => "voiceGenerationStatus",
            StatusField::VideoEditingStatus => "videoEditingStatus",
        }
    }

    /// Header text of the column in the tracking sheet.
    pub fn column_header(&self) -> &'static str {
        match self {
            StatusField::MainStatus => "Main Status",
            StatusField::ScriptApproved => "Script Approved",
            StatusField::VoiceGenerationStatus => "Voice Generation Status",
            StatusField::VideoEditingStatus => "Video Editing Status",
        }
    }
}

impl fmt::Display for StatusField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Raw cell values
// =============================================================================

/// A status cell as read from the sheet.
///
/// A missing or blank cell is `NotSet`, which compares unequal to every
/// label. It is never turned into an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum FieldValue {
    #[default]
    NotSet,
    Set(String),
}

impl FieldValue {
    /// Build from an optional sheet cell. Blank cells are `NotSet`.
    pub fn from_cell(cell: Option<&str>) -> Self {
        match cell.map(str::trim) {
            Some(s) if !s.is_empty() => FieldValue::Set(s.to_string()),
            _ => FieldValue::NotSet,
        }
    }

    pub fn set(value: impl Into<String>) -> Self {
        FieldValue::Set(value.into())
    }

    pub fn as_deref(&self) -> Option<&str> {
        match self {
            FieldValue::NotSet => None,
            FieldValue::Set(s) => Some(s.as_str()),
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, FieldValue::Set(_))
    }

    /// Interpret the cell as one of the typed vocabularies.
    pub fn parse<T: FromStr>(&self) -> Option<T> {
        self.as_deref().and_then(|s| s.parse().ok())
    }

    /// True when the cell holds exactly `label`.
    pub fn is(&self, label: &str) -> bool {
        self.as_deref() == Some(label)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::NotSet => write!(f, "(not set)"),
            FieldValue::Set(s) => write!(f, "{}", s),
        }
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(s) => FieldValue::Set(s),
            None => FieldValue::NotSet,
        }
    }
}

impl From<FieldValue> for Option<String> {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::NotSet => None,
            FieldValue::Set(s) => Some(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Set(s.to_string())
    }
}

// =============================================================================
// Typed vocabularies
// =============================================================================

/// Overall pipeline status of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MainStatus {
    #[serde(rename = "New")]
    New,
    #[serde(rename = "Processing")]
    Processing,
    #[serde(rename = "Script Separated")]
    ScriptSeparated,
    #[serde(rename = "Approved")]
    Approved,
    #[serde(rename = "Generating Images")]
    GeneratingImages,
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Error")]
    Error,
}

impl MainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MainStatus::New => "New",
            MainStatus::Processing => "Processing",
            MainStatus::ScriptSeparated => "Script Separated",
            MainStatus::Approved => "Approved",
            MainStatus::GeneratingImages => "Generating Images",
            MainStatus::Completed => "Completed",
            MainStatus::Error => "Error",
        }
    }
}

impl FromStr for MainStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "New" => Ok(MainStatus::New),
            "Processing" => Ok(MainStatus::Processing),
            "Script Separated" => Ok(MainStatus::ScriptSeparated),
            "Approved" => Ok(MainStatus::Approved),
            "Generating Images" => Ok(MainStatus::GeneratingImages),
            "Completed" => Ok(MainStatus::Completed),
            "Error" => Ok(MainStatus::Error),
            other => Err(ModelError::unknown_status("mainStatus", other)),
        }
    }
}

/// Human review state of the generated script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptApproval {
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Approved")]
    Approved,
    #[serde(rename = "Needs Changes")]
    NeedsChanges,
}

impl ScriptApproval {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptApproval::Pending => "Pending",
            ScriptApproval::Approved => "Approved",
            ScriptApproval::NeedsChanges => "Needs Changes",
        }
    }
}

impl FromStr for ScriptApproval {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Pending" => Ok(ScriptApproval::Pending),
            "Approved" => Ok(ScriptApproval::Approved),
            "Needs Changes" => Ok(ScriptApproval::NeedsChanges),
            other => Err(ModelError::unknown_status("scriptApproved", other)),
        }
    }
}

/// Voice-over recording state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoiceGenerationStatus {
    #[serde(rename = "Not Ready")]
    NotReady,
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Need Changes")]
    NeedChanges,
}

impl VoiceGenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceGenerationStatus::NotReady => "Not Ready",
            VoiceGenerationStatus::NotStarted => "Not Started",
            VoiceGenerationStatus::InProgress => "In Progress",
            VoiceGenerationStatus::Completed => "Completed",
            VoiceGenerationStatus::NeedChanges => "Need Changes",
        }
    }
}

impl FromStr for VoiceGenerationStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Not Ready" => Ok(VoiceGenerationStatus::NotReady),
            "Not Started" => Ok(VoiceGenerationStatus::NotStarted),
            "In Progress" => Ok(VoiceGenerationStatus::InProgress),
            "Completed" => Ok(VoiceGenerationStatus::Completed),
            "Need Changes" => Ok(VoiceGenerationStatus::NeedChanges),
            other => Err(ModelError::unknown_status("voiceGenerationStatus", other)),
        }
    }
}

/// Video editing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoEditingStatus {
    #[serde(rename = "Not Ready")]
    NotReady,
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "First Draft")]
    FirstDraft,
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Published")]
    Published,
}

impl VideoEditingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoEditingStatus::NotReady => "Not Ready",
            VideoEditingStatus::NotStarted => "Not Started",
            VideoEditingStatus::InProgress => "In Progress",
            VideoEditingStatus::FirstDraft => "First Draft",
            VideoEditingStatus::Completed => "Completed",
            VideoEditingStatus::Published => "Published",
        }
    }
}

impl FromStr for VideoEditingStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Not Ready" => Ok(VideoEditingStatus::NotReady),
            "Not Started" => Ok(VideoEditingStatus::NotStarted),
            "In Progress" => Ok(VideoEditingStatus::InProgress),
            "First Draft" => Ok(VideoEditingStatus::FirstDraft),
            "Completed" => Ok(VideoEditingStatus::Completed),
            "Published" => Ok(VideoEditingStatus::Published),
            other => Err(ModelError::unknown_status("videoEditingStatus", other)),
        }
    }
}

macro_rules! impl_label_conversions {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.as_str())
                }
            }

            impl From<$ty> for FieldValue {
                fn from(status: $ty) -> Self {
                    FieldValue::Set(status.as_str().to_string())
                }
            }
        )*
    };
}

impl_label_conversions!(MainStatus, ScriptApproval, VoiceGenerationStatus, VideoEditingStatus);
