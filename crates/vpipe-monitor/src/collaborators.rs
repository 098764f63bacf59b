//! Interfaces to the systems the monitor reads from and acts on.
//!
//! Implementations live in the transport crates (`vpipe-sheets`,
//! `vpipe-telegram`, `vpipe-queue`). Every call reports plain success or
//! failure; none of them may panic the calling cycle.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vpipe_models::{FieldTransition, FieldUpdates, FieldValue, Priority, SnapshotSet, StatusField, VideoId};

use crate::error::MonitorResult;

// =============================================================================
// Errors
// =============================================================================

/// Which collaborator a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorKind {
    SheetUpdate,
    Notification,
    Workflow,
    SnapshotStore,
}

impl fmt::Display for CollaboratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CollaboratorKind::SheetUpdate => "sheet update",
            CollaboratorKind::Notification => "notification",
            CollaboratorKind::Workflow => "workflow trigger",
            CollaboratorKind::SnapshotStore => "snapshot store",
        };
        write!(f, "{}", s)
    }
}

/// A failed collaborator call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} failed: {message}")]
pub struct CollaboratorError {
    pub kind: CollaboratorKind,
    pub message: String,
    /// Whether the same call could succeed on a later cycle.
    pub retryable: bool,
}

impl CollaboratorError {
    pub fn new(kind: CollaboratorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn sheet_update(message: impl Into<String>) -> Self {
        Self::new(CollaboratorKind::SheetUpdate, message)
    }

    pub fn notification(message: impl Into<String>) -> Self {
        Self::new(CollaboratorKind::Notification, message)
    }

    pub fn workflow(message: impl Into<String>) -> Self {
        Self::new(CollaboratorKind::Workflow, message)
    }

    pub fn snapshot_store(message: impl Into<String>) -> Self {
        Self::new(CollaboratorKind::SnapshotStore, message)
    }
}

// =============================================================================
// Messages
// =============================================================================

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Summary of a detected change group and its action outcomes.
    ChangeReport,
    /// Script approved and voice-over done; editing can begin.
    EditingReady,
    /// Editing completed for a video.
    FinalCompletion,
}

/// A message for the operators' channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub priority: Priority,
    pub video_id: VideoId,
    pub headline: String,
    pub lines: Vec<String>,
    pub link: Option<String>,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        priority: Priority,
        video_id: VideoId,
        headline: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            priority,
            video_id,
            headline: headline.into(),
            lines: Vec::new(),
            link: None,
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn with_link(mut self, link: Option<String>) -> Self {
        self.link = link;
        self
    }
}

/// A continuation call into the rest of the production pipeline.
/// The sheet edit that led to a workflow request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerCause {
    pub field: StatusField,
    pub old: FieldValue,
    pub new: FieldValue,
    /// Row's last-edited time when the change was detected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

impl TriggerCause {
    pub fn new(field: StatusField, transition: &FieldTransition, edited_at: Option<DateTime<Utc>>) -> Self {
        Self {
            field,
            old: transition.old.clone(),
            new: transition.new.clone(),
            edited_at,
        }
    }

    /// `field:old>new@millis`, with `-` for an unknown edit time.
    fn key(&self) -> String {
        let edited_at = self
            .edited_at
            .map(|t| t.timestamp_millis().to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{}:{}>{}@{}",
            self.field.as_str(),
            self.old.as_deref().unwrap_or(""),
            self.new.as_deref().unwrap_or(""),
            edited_at
        )
    }
}

/// A pipeline continuation, started through the workflow trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "workflow", rename_all = "snake_case")]
pub enum WorkflowRequest {
    /// Script approved: continue with image generation and voice-over prep.
    ApprovedScript {
        video_id: VideoId,
        title: String,
        workbook_url: Option<String>,
        cause: TriggerCause,
    },
    /// Reviewer asked for changes: regenerate the script breakdown.
    RegenerateScript {
        video_id: VideoId,
        title: String,
        cause: TriggerCause,
    },
    /// Main status changed: bring pipeline bookkeeping in line with the sheet.
    SyncStatus {
        video_id: VideoId,
        main_status: FieldValue,
        cause: TriggerCause,
    },
}

impl WorkflowRequest {
    pub fn video_id(&self) -> &VideoId {
        match self {
            WorkflowRequest::ApprovedScript { video_id, .. }
            | WorkflowRequest::RegenerateScript { video_id, .. }
            | WorkflowRequest::SyncStatus { video_id, .. } => video_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WorkflowRequest::ApprovedScript { .. } => "approved_script",
            WorkflowRequest::RegenerateScript { .. } => "regenerate_script",
            WorkflowRequest::SyncStatus { .. } => "sync_status",
        }
    }

    pub fn cause(&self) -> &TriggerCause {
        match self {
            WorkflowRequest::ApprovedScript { cause, .. }
            | WorkflowRequest::RegenerateScript { cause, .. }
            | WorkflowRequest::SyncStatus { cause, .. } => cause,
        }
    }

    /// Same key for the same edit detected again; a new key for a new edit
    /// of the same field, even one that repeats an earlier transition.
    pub fn idempotency_key(&self) -> String {
        format!("{}:{}:{}", self.name(), self.video_id(), self.cause().key())
    }
}

// =============================================================================
// Traits
// =============================================================================

/// Reads every tracked video from the system of record.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch all rows. Malformed rows are skipped by the implementation;
    /// any failure to read the sheet as a whole is an error.
    async fn fetch_all_video_snapshots(&self) -> MonitorResult<SnapshotSet>;
}

/// Writes status columns of a single video row.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SheetUpdater: Send + Sync {
    /// Idempotent: applying the same updates twice leaves the same row.
    async fn update_fields(
        &self,
        video_id: &VideoId,
        updates: &FieldUpdates,
    ) -> Result<(), CollaboratorError>;
}

/// Delivers operator notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), CollaboratorError>;
}

/// Starts a continuation of the production pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkflowTrigger: Send + Sync {
    async fn trigger(&self, request: &WorkflowRequest) -> Result<(), CollaboratorError>;
}

/// Persists the cached snapshot between process runs.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load(&self) -> Result<Option<SnapshotSet>, CollaboratorError>;
    async fn save(&self, snapshots: &SnapshotSet) -> Result<(), CollaboratorError>;
}
