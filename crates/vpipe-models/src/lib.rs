//! Shared data models for the vpipe status monitor.
//!
//! This crate provides Serde-serializable types for:
//! - Video identifiers and per-video status snapshots
//! - The closed set of monitored status fields and their sheet labels
//! - Status changes produced by diffing two snapshots
//! - Dispatch priorities, actions and per-action outcomes

pub mod change;
pub mod dispatch;
pub mod error;
pub mod snapshot;
pub mod status;
pub mod video;

// Re-export common types
pub use change::{FieldTransition, StatusChange};
pub use dispatch::{ActionOutcome, ActionReport, DispatchAction, DispatchResult, Priority};
pub use error::{ModelError, ModelResult};
pub use snapshot::{FieldUpdates, SnapshotSet, VideoStatusSnapshot};
pub use status::{
    FieldValue, MainStatus, ScriptApproval, StatusField, VideoEditingStatus,
    VoiceGenerationStatus,
};
pub use video::VideoId;
