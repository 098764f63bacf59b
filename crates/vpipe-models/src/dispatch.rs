//! Dispatch priorities, actions and outcomes.

use serde::Serialize;
use std::fmt;

use crate::snapshot::FieldUpdates;
use crate::video::VideoId;

/// How urgently a change group needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Critical,
    High,
    Medium,
    /// Fields outside the current comparison set.
    Normal,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Normal => "NORMAL",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named follow-up side effect of a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchAction {
    TriggerApprovedScriptWorkflow,
    TriggerScriptRegeneration,
    UpdateVoiceCompletionStatus,
    CheckVideoEditingEligibility,
    UpdateVideoCompletionStatus,
    NotifyFinalCompletion,
    UpdateRelatedColumns,
    SyncWorkflowStatus,
}

impl DispatchAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchAction::TriggerApprovedScriptWorkflow => "TRIGGER_APPROVED_SCRIPT_WORKFLOW",
            DispatchAction::TriggerScriptRegeneration => "TRIGGER_SCRIPT_REGENERATION",
            DispatchAction::UpdateVoiceCompletionStatus => "UPDATE_VOICE_COMPLETION_STATUS",
            DispatchAction::CheckVideoEditingEligibility => "CHECK_VIDEO_EDITING_ELIGIBILITY",
            DispatchAction::UpdateVideoCompletionStatus => "UPDATE_VIDEO_COMPLETION_STATUS",
            DispatchAction::NotifyFinalCompletion => "NOTIFY_FINAL_COMPLETION",
            DispatchAction::UpdateRelatedColumns => "UPDATE_RELATED_COLUMNS",
            DispatchAction::SyncWorkflowStatus => "SYNC_WORKFLOW_STATUS",
        }
    }
}

impl fmt::Display for DispatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of running a single action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    Succeeded,
    /// Nothing to do for the current row.
    Skipped { reason: String },
    Failed { error: String },
}

impl ActionOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self::Failed {
            error: error.to_string(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ActionOutcome::Failed { .. })
    }

    /// Label for metrics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionOutcome::Succeeded => "succeeded",
            ActionOutcome::Skipped { .. } => "skipped",
            ActionOutcome::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutcome::Succeeded => write!(f, "succeeded"),
            ActionOutcome::Skipped { reason } => write!(f, "skipped ({})", reason),
            ActionOutcome::Failed { error } => write!(f, "failed: {}", error),
        }
    }
}

/// One attempted action and how it ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReport {
    pub action: DispatchAction,
    pub outcome: ActionOutcome,
}

/// Outcome of dispatching one video's change group.
///
/// Returned to the caller for reporting; the sheet stays the system of
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub video_id: VideoId,
    pub priority: Priority,
    pub actions: Vec<ActionReport>,
    /// Change report delivery, when one was sent.
    pub notification: Option<ActionOutcome>,
    /// Columns the dispatcher wrote to the sheet for this video.
    #[serde(skip_serializing_if = "FieldUpdates::is_empty")]
    pub applied: FieldUpdates,
}

impl DispatchResult {
    /// True when no action failed. Change-report delivery does not count.
    pub fn is_success(&self) -> bool {
        !self.actions.iter().any(|r| r.outcome.is_failed())
    }

    pub fn failed_actions(&self) -> impl Iterator<Item = &ActionReport> {
        self.actions.iter().filter(|r| r.outcome.is_failed())
    }

    pub fn attempted(&self) -> impl Iterator<Item = DispatchAction> + '_ {
        self.actions.iter().map(|r| r.action)
    }
}
