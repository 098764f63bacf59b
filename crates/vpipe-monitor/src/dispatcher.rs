//! Action execution for change groups.
//!
//! One group's actions run one after another against a working copy of the
//! video's row, so a later action sees the columns an earlier one wrote.
//! A failed action is recorded and the rest of the group still runs.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, info_span, warn, Instrument};

use vpipe_models::{
    ActionOutcome, ActionReport, DispatchAction, DispatchResult, FieldTransition, FieldUpdates,
    FieldValue, MainStatus, Priority, ScriptApproval, StatusChange, StatusField, VideoEditingStatus,
    VideoStatusSnapshot, VoiceGenerationStatus,
};

use crate::collaborators::{
    CollaboratorError, Notification, NotificationKind, Notifier, SheetUpdater, TriggerCause,
    WorkflowRequest, WorkflowTrigger,
};
use crate::metrics::{record_action, record_notification};
use crate::rules::plan;

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Send a change report for every dispatched group.
    pub change_reports: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            change_reports: true,
        }
    }
}

/// Runs dispatch plans against the sheet, the notifier and the pipeline.
#[derive(Clone)]
pub struct Dispatcher {
    sheet: Arc<dyn SheetUpdater>,
    notifier: Arc<dyn Notifier>,
    workflow: Arc<dyn WorkflowTrigger>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        sheet: Arc<dyn SheetUpdater>,
        notifier: Arc<dyn Notifier>,
        workflow: Arc<dyn WorkflowTrigger>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            sheet,
            notifier,
            workflow,
            config,
        }
    }

    /// Dispatch many groups, at most `max_parallel` at a time.
    ///
    /// Each group only touches its own video's row. Result order is not
    /// specified.
    pub async fn dispatch_all(
        &self,
        groups: Vec<(StatusChange, VideoStatusSnapshot)>,
        max_parallel: usize,
    ) -> Vec<DispatchResult> {
        stream::iter(groups)
            .map(|(change, row)| async move { self.dispatch(&change, &row).await })
            .buffer_unordered(max_parallel.max(1))
            .collect()
            .await
    }

    /// Dispatch one video's change group.
    ///
    /// `row` is the freshly fetched snapshot of the same video.
    pub async fn dispatch(&self, change: &StatusChange, row: &VideoStatusSnapshot) -> DispatchResult {
        let plan = plan(change);
        let span = info_span!(
            "dispatch",
            video_id = %change.video_id,
            priority = %plan.priority,
            actions = plan.actions.len()
        );

        async {
            let mut working = row.clone();
            let mut reports = Vec::with_capacity(plan.actions.len());

            for action in &plan.actions {
                let outcome = self.run_action(*action, plan.priority, change, &mut working).await;
                record_action(*action, &outcome);

                match &outcome {
                    ActionOutcome::Failed { error } => {
                        warn!(action = %action, error = %error, "Dispatch action failed")
                    }
                    ActionOutcome::Skipped { reason } => {
                        debug!(action = %action, reason = %reason, "Dispatch action skipped")
                    }
                    ActionOutcome::Succeeded => info!(action = %action, "Dispatch action succeeded"),
                }

                reports.push(ActionReport {
                    action: *action,
                    outcome,
                });
            }

            let notification = if self.config.change_reports {
                let report = change_report(change, plan.priority, &reports, &working);
                Some(self.send(&report).await)
            } else {
                None
            };

            DispatchResult {
                video_id: change.video_id.clone(),
                priority: plan.priority,
                actions: reports,
                notification,
                applied: applied_updates(row, &working),
            }
        }
        .instrument(span)
        .await
    }

    async fn run_action(
        &self,
        action: DispatchAction,
        priority: Priority,
        change: &StatusChange,
        working: &mut VideoStatusSnapshot,
    ) -> ActionOutcome {
        match action {
            DispatchAction::UpdateRelatedColumns => {
                let updates = related_column_updates(working);
                self.write(working, updates, "no related columns to update").await
            }
            DispatchAction::SyncWorkflowStatus => {
                self.trigger(WorkflowRequest::SyncStatus {
                    video_id: working.video_id.clone(),
                    main_status: working.main_status.clone(),
                    cause: trigger_cause(change, StatusField::MainStatus, working),
                })
                .await
            }
            DispatchAction::TriggerApprovedScriptWorkflow => {
                self.trigger(WorkflowRequest::ApprovedScript {
                    video_id: working.video_id.clone(),
                    title: working.title.clone(),
                    workbook_url: working.workbook_url.clone(),
                    cause: trigger_cause(change, StatusField::ScriptApproved, working),
                })
                .await
            }
            DispatchAction::TriggerScriptRegeneration => {
                self.trigger(WorkflowRequest::RegenerateScript {
                    video_id: working.video_id.clone(),
                    title: working.title.clone(),
                    cause: trigger_cause(change, StatusField::ScriptApproved, working),
                })
                .await
            }
            DispatchAction::UpdateVoiceCompletionStatus => {
                let updates = voice_completion_updates(working);
                self.write(working, updates, "video editing already unlocked").await
            }
            DispatchAction::CheckVideoEditingEligibility => match editing_blocker(working) {
                Some(reason) => ActionOutcome::skipped(reason),
                None => {
                    let message = Notification::new(
                        NotificationKind::EditingReady,
                        priority,
                        working.video_id.clone(),
                        format!("Ready for editing: {}", working.display_title()),
                    )
                    .line("Script approved and voice-over completed.")
                    .with_link(working.drive_folder_url.clone());
                    self.send(&message).await
                }
            },
            DispatchAction::UpdateVideoCompletionStatus => {
                let mut updates = FieldUpdates::new();
                if working.main_status() != Some(MainStatus::Completed) {
                    updates.set(StatusField::MainStatus, MainStatus::Completed.as_str());
                }
                self.write(working, updates, "main status already completed").await
            }
            DispatchAction::NotifyFinalCompletion => {
                let message = Notification::new(
                    NotificationKind::FinalCompletion,
                    priority,
                    working.video_id.clone(),
                    format!("Video completed: {}", working.display_title()),
                )
                .line("Video editing is complete.")
                .with_link(working.drive_folder_url.clone());
                self.send(&message).await
            }
        }
    }

    /// Write column updates and mirror them into the working row.
    async fn write(
        &self,
        working: &mut VideoStatusSnapshot,
        updates: FieldUpdates,
        skip_reason: &str,
    ) -> ActionOutcome {
        if updates.is_empty() {
            return ActionOutcome::skipped(skip_reason);
        }

        match self.sheet.update_fields(&working.video_id, &updates).await {
            Ok(()) => {
                working.apply_updates(&updates);
                ActionOutcome::Succeeded
            }
            Err(e) => ActionOutcome::failed(e),
        }
    }

    async fn trigger(&self, request: WorkflowRequest) -> ActionOutcome {
        outcome(self.workflow.trigger(&request).await)
    }

    async fn send(&self, notification: &Notification) -> ActionOutcome {
        let result = self.notifier.notify(notification).await;
        record_notification(notification.kind, result.is_ok());
        if let Err(e) = &result {
            warn!(kind = ?notification.kind, error = %e, "Notification not delivered");
        }
        outcome(result)
    }
}

fn outcome(result: Result<(), CollaboratorError>) -> ActionOutcome {
    match result {
        Ok(()) => ActionOutcome::Succeeded,
        Err(e) => ActionOutcome::failed(e),
    }
}

// =============================================================================
// Row-derived updates
// =============================================================================

/// Columns that follow from the current main status.
fn related_column_updates(row: &VideoStatusSnapshot) -> FieldUpdates {
    let mut updates = FieldUpdates::new();

    match row.main_status() {
        Some(MainStatus::Approved) => {
            if row.script_approved() != Some(ScriptApproval::Approved) {
                updates.set(StatusField::ScriptApproved, ScriptApproval::Approved.as_str());
            }
            if unset_or(&row.voice_generation_status, VoiceGenerationStatus::NotReady.as_str()) {
                updates.set(
                    StatusField::VoiceGenerationStatus,
                    VoiceGenerationStatus::NotStarted.as_str(),
                );
            }
        }
        Some(MainStatus::ScriptSeparated) => {
            if !row.script_approved.is_set() {
                updates.set(StatusField::ScriptApproved, ScriptApproval::Pending.as_str());
            }
        }
        _ => {}
    }

    updates
}

/// Unlock editing once the voice-over is done.
fn voice_completion_updates(row: &VideoStatusSnapshot) -> FieldUpdates {
    let mut updates = FieldUpdates::new();
    if unset_or(&row.video_editing_status, VideoEditingStatus::NotReady.as_str()) {
        updates.set(
            StatusField::VideoEditingStatus,
            VideoEditingStatus::NotStarted.as_str(),
        );
    }
    updates
}

/// Why the row is not ready for editing, if it is not.
fn editing_blocker(row: &VideoStatusSnapshot) -> Option<String> {
    if row.script_approved() != Some(ScriptApproval::Approved) {
        return Some(format!("script approval is {}", row.script_approved));
    }
    if row.voice_generation_status() != Some(VoiceGenerationStatus::Completed) {
        return Some(format!("voice generation is {}", row.voice_generation_status));
    }
    if row.video_editing_status() != Some(VideoEditingStatus::NotStarted) {
        return Some(format!("video editing is {}", row.video_editing_status));
    }
    None
}

/// The detected transition of `field`, stamped with the row's edit time.
///
/// Actions are planned from the change's own fields, so the transition is
/// normally present; otherwise the current value stands in for both ends.
fn trigger_cause(change: &StatusChange, field: StatusField, row: &VideoStatusSnapshot) -> TriggerCause {
    let transition = change.get(field).cloned().unwrap_or_else(|| {
        let value = row.value(field).clone();
        FieldTransition::new(value.clone(), value)
    });
    TriggerCause::new(field, &transition, row.last_edited_time)
}

/// Columns that differ between the fetched row and the working copy.
///
/// The working copy only changes through successful sheet writes.
fn applied_updates(fetched: &VideoStatusSnapshot, working: &VideoStatusSnapshot) -> FieldUpdates {
    let mut applied = FieldUpdates::new();
    for field in StatusField::ALL {
        let value = working.value(field);
        if value != fetched.value(field) {
            if let Some(written) = value.as_deref() {
                applied.set(field, written);
            }
        }
    }
    applied
}

/// Blank or exactly `label`. Any other hand-typed value is left alone.
fn unset_or(value: &FieldValue, label: &str) -> bool {
    !value.is_set() || value.is(label)
}

fn change_report(
    change: &StatusChange,
    priority: Priority,
    reports: &[ActionReport],
    row: &VideoStatusSnapshot,
) -> Notification {
    let mut message = Notification::new(
        NotificationKind::ChangeReport,
        priority,
        change.video_id.clone(),
        format!("Status change: {}", row.display_title()),
    );

    for (field, transition) in &change.changes {
        message = message.line(format!(
            "{}: {} → {}",
            field.column_header(),
            transition.old,
            transition.new
        ));
    }
    for report in reports {
        message = message.line(format!("{}: {}", report.action, report.outcome));
    }

    message.with_link(row.workbook_url.clone().or_else(|| row.drive_folder_url.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use vpipe_models::VideoId;

    use crate::collaborators::{MockNotifier, MockSheetUpdater, MockWorkflowTrigger};

    // =========================================================================
    // Recording fakes
    // =========================================================================

    #[derive(Default)]
    struct FakeSheet {
        writes: Mutex<Vec<(VideoId, FieldUpdates)>>,
        fail: bool,
    }

    #[async_trait]
    impl SheetUpdater for FakeSheet {
        async fn update_fields(
            &self,
            video_id: &VideoId,
            updates: &FieldUpdates,
        ) -> Result<(), CollaboratorError> {
            if self.fail {
                return Err(CollaboratorError::sheet_update("quota exceeded"));
            }
            self.writes
                .lock()
                .unwrap()
                .push((video_id.clone(), updates.clone()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        sent: Mutex<Vec<Notification>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for FakeNotifier {
        async fn notify(&self, notification: &Notification) -> Result<(), CollaboratorError> {
            if self.fail {
                return Err(CollaboratorError::notification("bot blocked"));
            }
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeWorkflow {
        requests: Mutex<Vec<WorkflowRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl WorkflowTrigger for FakeWorkflow {
        async fn trigger(&self, request: &WorkflowRequest) -> Result<(), CollaboratorError> {
            if self.fail {
                return Err(CollaboratorError::workflow("redis unavailable").retryable(true));
            }
            self.requests.lock().unwrap().push(request.clone());
            Ok(())
        }
    }

    struct Harness {
        sheet: Arc<FakeSheet>,
        notifier: Arc<FakeNotifier>,
        workflow: Arc<FakeWorkflow>,
        dispatcher: Dispatcher,
    }

    fn harness(sheet: FakeSheet, notifier: FakeNotifier, workflow: FakeWorkflow) -> Harness {
        let sheet = Arc::new(sheet);
        let notifier = Arc::new(notifier);
        let workflow = Arc::new(workflow);
        let dispatcher = Dispatcher::new(
            sheet.clone(),
            notifier.clone(),
            workflow.clone(),
            DispatcherConfig::default(),
        );
        Harness {
            sheet,
            notifier,
            workflow,
            dispatcher,
        }
    }

    fn change_for(row: &VideoStatusSnapshot, transitions: &[(StatusField, &str)]) -> StatusChange {
        let changes: BTreeMap<_, _> = transitions
            .iter()
            .map(|(f, old)| (*f, FieldTransition::new(*old, row.value(*f).clone())))
            .collect();
        StatusChange {
            video_id: row.video_id.clone(),
            title: row.title.clone(),
            changes,
        }
    }

    fn approved_row() -> VideoStatusSnapshot {
        VideoStatusSnapshot::new(VideoId::from_number(1), "Launch video")
            .with(StatusField::MainStatus, "Approved")
            .with(StatusField::ScriptApproved, "Approved")
            .with(StatusField::VoiceGenerationStatus, "Not Started")
            .with(StatusField::VideoEditingStatus, "")
    }

    // =========================================================================
    // Tests
    // =========================================================================

    #[tokio::test]
    async fn test_approval_scenario_runs_actions_in_plan_order() {
        let h = harness(FakeSheet::default(), FakeNotifier::default(), FakeWorkflow::default());
        let row = approved_row();
        let change = change_for(
            &row,
            &[(StatusField::MainStatus, "Processing"), (StatusField::ScriptApproved, "Pending")],
        );

        let result = h.dispatcher.dispatch(&change, &row).await;

        assert_eq!(result.priority, Priority::Critical);
        assert_eq!(
            result.attempted().collect::<Vec<_>>(),
            vec![
                DispatchAction::UpdateRelatedColumns,
                DispatchAction::SyncWorkflowStatus,
                DispatchAction::TriggerApprovedScriptWorkflow,
            ]
        );
        assert!(result.is_success());
        // Script is already approved and voice is already unlocked.
        assert!(matches!(result.actions[0].outcome, ActionOutcome::Skipped { .. }));
        assert!(h.sheet.writes.lock().unwrap().is_empty());

        let requests = h.workflow.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].name(), "sync_status");
        assert_eq!(requests[1].name(), "approved_script");

        let sent = h.notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, NotificationKind::ChangeReport);
        assert_eq!(sent[0].priority, Priority::Critical);
        assert!(sent[0].lines.iter().any(|l| l == "Main Status: Processing → Approved"));
    }

    #[tokio::test]
    async fn test_related_columns_follow_main_status_approval() {
        let h = harness(FakeSheet::default(), FakeNotifier::default(), FakeWorkflow::default());
        let row = VideoStatusSnapshot::new(VideoId::from_number(2), "Teaser")
            .with(StatusField::MainStatus, "Approved")
            .with(StatusField::ScriptApproved, "Pending")
            .with(StatusField::VoiceGenerationStatus, "Not Ready");
        let change = change_for(&row, &[(StatusField::MainStatus, "Script Separated")]);

        let result = h.dispatcher.dispatch(&change, &row).await;

        assert_eq!(result.actions[0].outcome, ActionOutcome::Succeeded);
        let writes = h.sheet.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].1.get(StatusField::ScriptApproved), Some("Approved"));
        assert_eq!(writes[0].1.get(StatusField::VoiceGenerationStatus), Some("Not Started"));
        assert_eq!(result.applied, writes[0].1);
    }

    #[tokio::test]
    async fn test_later_action_sees_earlier_column_update() {
        let h = harness(FakeSheet::default(), FakeNotifier::default(), FakeWorkflow::default());
        let row = VideoStatusSnapshot::new(VideoId::from_number(3), "Explainer")
            .with(StatusField::MainStatus, "Generating Images")
            .with(StatusField::ScriptApproved, "Approved")
            .with(StatusField::VoiceGenerationStatus, "Completed")
            .with(StatusField::VideoEditingStatus, "Not Ready");
        let change = change_for(&row, &[(StatusField::VoiceGenerationStatus, "In Progress")]);

        let result = h.dispatcher.dispatch(&change, &row).await;

        assert_eq!(
            result.actions,
            vec![
                ActionReport {
                    action: DispatchAction::UpdateVoiceCompletionStatus,
                    outcome: ActionOutcome::Succeeded,
                },
                ActionReport {
                    action: DispatchAction::CheckVideoEditingEligibility,
                    outcome: ActionOutcome::Succeeded,
                },
            ]
        );
        let sent = h.notifier.sent.lock().unwrap();
        assert_eq!(sent[0].kind, NotificationKind::EditingReady);
        assert_eq!(sent[1].kind, NotificationKind::ChangeReport);
    }

    #[tokio::test]
    async fn test_eligibility_check_skips_when_script_not_approved() {
        let h = harness(FakeSheet::default(), FakeNotifier::default(), FakeWorkflow::default());
        let row = VideoStatusSnapshot::new(VideoId::from_number(4), "Recap")
            .with(StatusField::ScriptApproved, "Pending")
            .with(StatusField::VoiceGenerationStatus, "Completed")
            .with(StatusField::VideoEditingStatus, "Not Started");
        let change = change_for(&row, &[(StatusField::VoiceGenerationStatus, "In Progress")]);

        let result = h.dispatcher.dispatch(&change, &row).await;

        assert_eq!(
            result.actions[1].outcome,
            ActionOutcome::skipped("script approval is Pending")
        );
    }

    #[tokio::test]
    async fn test_failed_action_does_not_abort_group() {
        let h = harness(
            FakeSheet::default(),
            FakeNotifier::default(),
            FakeWorkflow {
                fail: true,
                ..Default::default()
            },
        );
        let row = approved_row().with(StatusField::ScriptApproved, "Pending");
        let change = change_for(&row, &[(StatusField::MainStatus, "Processing")]);

        let result = h.dispatcher.dispatch(&change, &row).await;

        assert_eq!(result.actions.len(), 2);
        assert_eq!(result.actions[0].outcome, ActionOutcome::Succeeded);
        assert!(result.actions[1].outcome.is_failed());
        assert!(!result.is_success());
        // The change report still goes out and lists the failure.
        let sent = h.notifier.sent.lock().unwrap();
        assert!(sent[0].lines.iter().any(|l| l.starts_with("SYNC_WORKFLOW_STATUS: failed")));
    }

    #[tokio::test]
    async fn test_sheet_failure_leaves_working_row_unchanged() {
        let h = harness(
            FakeSheet {
                fail: true,
                ..Default::default()
            },
            FakeNotifier::default(),
            FakeWorkflow::default(),
        );
        let row = VideoStatusSnapshot::new(VideoId::from_number(5), "Shorts")
            .with(StatusField::ScriptApproved, "Approved")
            .with(StatusField::VoiceGenerationStatus, "Completed")
            .with(StatusField::VideoEditingStatus, "Not Ready");
        let change = change_for(&row, &[(StatusField::VoiceGenerationStatus, "In Progress")]);

        let result = h.dispatcher.dispatch(&change, &row).await;

        assert!(result.actions[0].outcome.is_failed());
        assert_eq!(
            result.actions[1].outcome,
            ActionOutcome::skipped("video editing is Not Ready")
        );
        assert!(result.applied.is_empty());
    }

    #[tokio::test]
    async fn test_editing_completion_marks_video_completed_and_notifies() {
        let h = harness(FakeSheet::default(), FakeNotifier::default(), FakeWorkflow::default());
        let mut row = VideoStatusSnapshot::new(VideoId::from_number(6), "Finale")
            .with(StatusField::MainStatus, "Generating Images")
            .with(StatusField::VideoEditingStatus, "Completed");
        row.drive_folder_url = Some("https://drive.example/folder/6".into());
        let change = change_for(&row, &[(StatusField::VideoEditingStatus, "First Draft")]);

        let result = h.dispatcher.dispatch(&change, &row).await;

        assert!(result.is_success());
        let writes = h.sheet.writes.lock().unwrap();
        assert_eq!(writes[0].1.get(StatusField::MainStatus), Some("Completed"));
        let sent = h.notifier.sent.lock().unwrap();
        assert_eq!(sent[0].kind, NotificationKind::FinalCompletion);
        assert_eq!(sent[0].link.as_deref(), Some("https://drive.example/folder/6"));
    }

    #[tokio::test]
    async fn test_regeneration_request() {
        let h = harness(FakeSheet::default(), FakeNotifier::default(), FakeWorkflow::default());
        let row = VideoStatusSnapshot::new(VideoId::from_number(7), "Tutorial")
            .with(StatusField::ScriptApproved, "Needs Changes");
        let change = change_for(&row, &[(StatusField::ScriptApproved, "Pending")]);

        let result = h.dispatcher.dispatch(&change, &row).await;

        assert_eq!(result.priority, Priority::Critical);
        assert_eq!(
            h.workflow.requests.lock().unwrap()[0],
            WorkflowRequest::RegenerateScript {
                video_id: VideoId::from_number(7),
                title: "Tutorial".into(),
                cause: TriggerCause::new(
                    StatusField::ScriptApproved,
                    &FieldTransition::new("Pending", "Needs Changes"),
                    None,
                ),
            }
        );
    }

    #[tokio::test]
    async fn test_repeated_approval_gets_a_new_idempotency_key() {
        let h = harness(FakeSheet::default(), FakeNotifier::default(), FakeWorkflow::default());
        let approved_at = |minute| {
            let mut row = VideoStatusSnapshot::new(VideoId::from_number(11), "Recap")
                .with(StatusField::ScriptApproved, "Approved");
            row.last_edited_time = Utc.with_ymd_and_hms(2026, 3, 2, 9, minute, 0).single();
            row
        };
        let first = approved_at(0);
        let again = approved_at(3);

        h.dispatcher
            .dispatch(&change_for(&first, &[(StatusField::ScriptApproved, "Pending")]), &first)
            .await;
        h.dispatcher
            .dispatch(&change_for(&again, &[(StatusField::ScriptApproved, "Pending")]), &again)
            .await;

        let requests = h.workflow.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].name(), "approved_script");
        assert_eq!(requests[0].cause().old.as_deref(), Some("Pending"));
        assert_ne!(requests[0].idempotency_key(), requests[1].idempotency_key());
    }

    #[tokio::test]
    async fn test_unlisted_transition_has_no_actions_but_is_reported() {
        let h = harness(FakeSheet::default(), FakeNotifier::default(), FakeWorkflow::default());
        let row = VideoStatusSnapshot::new(VideoId::from_number(8), "Vlog")
            .with(StatusField::VideoEditingStatus, "First Draft");
        let change = change_for(&row, &[(StatusField::VideoEditingStatus, "In Progress")]);

        let result = h.dispatcher.dispatch(&change, &row).await;

        assert!(result.actions.is_empty());
        assert_eq!(result.notification, Some(ActionOutcome::Succeeded));
    }

    #[tokio::test]
    async fn test_change_reports_can_be_disabled() {
        let notifier = Arc::new(FakeNotifier::default());
        let dispatcher = Dispatcher::new(
            Arc::new(FakeSheet::default()),
            notifier.clone(),
            Arc::new(FakeWorkflow::default()),
            DispatcherConfig {
                change_reports: false,
            },
        );
        let row = VideoStatusSnapshot::new(VideoId::from_number(9), "Clip")
            .with(StatusField::VideoEditingStatus, "First Draft");
        let change = change_for(&row, &[(StatusField::VideoEditingStatus, "In Progress")]);

        let result = dispatcher.dispatch(&change, &row).await;

        assert_eq!(result.notification, None);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notification_failure_is_contained() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(2)
            .returning(|_| Err(CollaboratorError::notification("429 Too Many Requests")));

        let mut sheet = MockSheetUpdater::new();
        sheet.expect_update_fields().times(1).returning(|_, _| Ok(()));

        let mut workflow = MockWorkflowTrigger::new();
        workflow.expect_trigger().never();

        let dispatcher = Dispatcher::new(
            Arc::new(sheet),
            Arc::new(notifier),
            Arc::new(workflow),
            DispatcherConfig::default(),
        );
        let row = VideoStatusSnapshot::new(VideoId::from_number(10), "Review")
            .with(StatusField::MainStatus, "Approved")
            .with(StatusField::VideoEditingStatus, "Completed");
        let change = change_for(&row, &[(StatusField::VideoEditingStatus, "First Draft")]);

        let result = dispatcher.dispatch(&change, &row).await;

        assert_eq!(result.actions[0].outcome, ActionOutcome::Succeeded);
        assert!(result.actions[1].outcome.is_failed());
        assert!(matches!(result.notification, Some(ActionOutcome::Failed { .. })));
    }

    #[tokio::test]
    async fn test_dispatch_all_handles_every_group() {
        let h = harness(FakeSheet::default(), FakeNotifier::default(), FakeWorkflow::default());
        let groups: Vec<_> = (1..=5)
            .map(|n| {
                let row = VideoStatusSnapshot::new(VideoId::from_number(n), format!("Video {n}"))
                    .with(StatusField::MainStatus, "Error");
                let change = change_for(&row, &[(StatusField::MainStatus, "Processing")]);
                (change, row)
            })
            .collect();

        let mut results = h.dispatcher.dispatch_all(groups, 2).await;
        results.sort_by(|a, b| a.video_id.cmp(&b.video_id));

        assert_eq!(results.len(), 5);
        assert_eq!(results[0].video_id, VideoId::from_number(1));
        assert!(results.iter().all(|r| r.priority == Priority::High));
        assert_eq!(h.workflow.requests.lock().unwrap().len(), 5);
    }

    #[test]
    fn test_unknown_labels_are_not_overwritten() {
        let row = VideoStatusSnapshot::new(VideoId::from_number(11), "Odd")
            .with(StatusField::VideoEditingStatus, "Waiting on client");
        assert!(voice_completion_updates(&row).is_empty());

        let unset = VideoStatusSnapshot::new(VideoId::from_number(12), "Blank");
        assert_eq!(
            voice_completion_updates(&unset).get(StatusField::VideoEditingStatus),
            Some("Not Started")
        );
        assert!(FieldValue::NotSet.parse::<VideoEditingStatus>().is_none());
    }
}
