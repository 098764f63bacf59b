//! Monitor metrics collection.
//!
//! Provides standardized metrics for poll cycles:
//! - Cycle counters by result and latency histograms
//! - Detected changes by field and priority
//! - Dispatch action outcomes and notification deliveries

use metrics::{counter, gauge, histogram};

use vpipe_models::{ActionOutcome, DispatchAction, Priority, StatusField};

use crate::collaborators::NotificationKind;

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Completed poll cycles by result (`ok`, `partial`, `fetch_failed`).
    pub const CYCLES_TOTAL: &str = "monitor_cycles_total";

    /// Poll cycle duration in seconds.
    pub const CYCLE_SECONDS: &str = "monitor_cycle_seconds";

    /// Videos in the most recent snapshot.
    pub const TRACKED_VIDEOS: &str = "monitor_tracked_videos";

    /// Reported field changes by field.
    pub const CHANGES_TOTAL: &str = "monitor_changes_detected_total";

    /// Change groups by priority.
    pub const GROUPS_TOTAL: &str = "monitor_change_groups_total";

    /// Dispatch actions by action and outcome.
    pub const ACTIONS_TOTAL: &str = "monitor_actions_total";

    /// Notification deliveries by kind and result.
    pub const NOTIFICATIONS_TOTAL: &str = "monitor_notifications_total";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record the end of a poll cycle.
pub fn record_cycle(result: &'static str, elapsed_secs: f64) {
    counter!(names::CYCLES_TOTAL, "result" => result).increment(1);
    histogram!(names::CYCLE_SECONDS).record(elapsed_secs);
}

pub fn record_tracked_videos(count: usize) {
    gauge!(names::TRACKED_VIDEOS).set(count as f64);
}

/// Record one change group.
pub fn record_change_group(priority: Priority, fields: impl Iterator<Item = StatusField>) {
    counter!(names::GROUPS_TOTAL, "priority" => priority.as_str()).increment(1);
    for field in fields {
        counter!(names::CHANGES_TOTAL, "field" => field.as_str()).increment(1);
    }
}

pub fn record_action(action: DispatchAction, outcome: &ActionOutcome) {
    counter!(
        names::ACTIONS_TOTAL,
        "action" => action.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

pub fn record_notification(kind: NotificationKind, delivered: bool) {
    let kind = match kind {
        NotificationKind::ChangeReport => "change_report",
        NotificationKind::EditingReady => "editing_ready",
        NotificationKind::FinalCompletion => "final_completion",
    };
    let result = if delivered { "delivered" } else { "failed" };
    counter!(names::NOTIFICATIONS_TOTAL, "kind" => kind, "result" => result).increment(1);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::CYCLES_TOTAL.starts_with("monitor_"));
        assert!(names::ACTIONS_TOTAL.contains("actions"));
        assert!(names::CHANGES_TOTAL.contains("changes"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_action(DispatchAction::SyncWorkflowStatus, &ActionOutcome::Succeeded);
        record_notification(NotificationKind::ChangeReport, false);
        record_change_group(Priority::High, [StatusField::MainStatus].into_iter());
    }
}
