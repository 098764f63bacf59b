//! Priority classification and the action table.

use vpipe_models::{
    DispatchAction, FieldValue, Priority, ScriptApproval, StatusChange, StatusField,
    VideoEditingStatus, VoiceGenerationStatus,
};

/// Priority rules, checked in order. The first rule with a changed field wins.
const PRIORITY_RULES: &[(Priority, &[StatusField])] = &[
    (Priority::Critical, &[StatusField::ScriptApproved]),
    (Priority::High, &[StatusField::MainStatus]),
    (
        Priority::Medium,
        &[StatusField::VoiceGenerationStatus, StatusField::VideoEditingStatus],
    ),
];

/// Classify a change group.
pub fn classify(change: &StatusChange) -> Priority {
    PRIORITY_RULES
        .iter()
        .find(|(_, fields)| fields.iter().any(|f| change.has(*f)))
        .map(|(priority, _)| *priority)
        .unwrap_or(Priority::Normal)
}

/// Actions for one field reaching `new`.
pub fn actions_for(field: StatusField, new: &FieldValue) -> &'static [DispatchAction] {
    use DispatchAction::*;

    match field {
        StatusField::ScriptApproved => match new.parse::<ScriptApproval>() {
            Some(ScriptApproval::Approved) => &[TriggerApprovedScriptWorkflow],
            Some(ScriptApproval::NeedsChanges) => &[TriggerScriptRegeneration],
            Some(ScriptApproval::Pending) | None => &[],
        },
        StatusField::VoiceGenerationStatus => match new.parse::<VoiceGenerationStatus>() {
            Some(VoiceGenerationStatus::Completed) => {
                &[UpdateVoiceCompletionStatus, CheckVideoEditingEligibility]
            }
            Some(
                VoiceGenerationStatus::NotReady
                | VoiceGenerationStatus::NotStarted
                | VoiceGenerationStatus::InProgress
                | VoiceGenerationStatus::NeedChanges,
            )
            | None => &[],
        },
        StatusField::VideoEditingStatus => match new.parse::<VideoEditingStatus>() {
            Some(VideoEditingStatus::Completed) => {
                &[UpdateVideoCompletionStatus, NotifyFinalCompletion]
            }
            Some(
                VideoEditingStatus::NotReady
                | VideoEditingStatus::NotStarted
                | VideoEditingStatus::InProgress
                | VideoEditingStatus::FirstDraft
                | VideoEditingStatus::Published,
            )
            | None => &[],
        },
        StatusField::MainStatus => &[UpdateRelatedColumns, SyncWorkflowStatus],
    }
}

/// Priority and ordered action list for one change group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPlan {
    pub priority: Priority,
    pub actions: Vec<DispatchAction>,
}

/// Build the plan for a change group.
///
/// Actions are the union of every changed field's actions, in field order
/// and then table order, without duplicates.
pub fn plan(change: &StatusChange) -> DispatchPlan {
    let mut actions: Vec<DispatchAction> = Vec::new();

    for (field, transition) in &change.changes {
        for action in actions_for(*field, &transition.new) {
            if !actions.contains(action) {
                actions.push(*action);
            }
        }
    }

    DispatchPlan {
        priority: classify(change),
        actions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use vpipe_models::{FieldTransition, VideoId};

    fn change(transitions: &[(StatusField, &str, &str)]) -> StatusChange {
        let changes: BTreeMap<_, _> = transitions
            .iter()
            .map(|(f, old, new)| (*f, FieldTransition::new(*old, *new)))
            .collect();
        StatusChange {
            video_id: VideoId::from_number(1),
            title: "Launch video".into(),
            changes,
        }
    }

    #[test]
    fn test_script_approval_beats_main_status() {
        let c = change(&[
            (StatusField::MainStatus, "Processing", "Approved"),
            (StatusField::ScriptApproved, "Pending", "Approved"),
        ]);
        assert_eq!(classify(&c), Priority::Critical);
    }

    #[test]
    fn test_main_status_is_high() {
        let c = change(&[
            (StatusField::MainStatus, "Processing", "Error"),
            (StatusField::VideoEditingStatus, "In Progress", "First Draft"),
        ]);
        assert_eq!(classify(&c), Priority::High);
    }

    #[test]
    fn test_voice_and_editing_are_medium() {
        assert_eq!(
            classify(&change(&[(StatusField::VoiceGenerationStatus, "In Progress", "Completed")])),
            Priority::Medium
        );
        assert_eq!(
            classify(&change(&[(StatusField::VideoEditingStatus, "In Progress", "Completed")])),
            Priority::Medium
        );
    }

    #[test]
    fn test_no_matching_rule_is_normal() {
        assert_eq!(classify(&change(&[])), Priority::Normal);
    }

    #[test]
    fn test_action_table() {
        use DispatchAction::*;

        let cases: &[(StatusField, &str, &[DispatchAction])] = &[
            (StatusField::ScriptApproved, "Approved", &[TriggerApprovedScriptWorkflow]),
            (StatusField::ScriptApproved, "Needs Changes", &[TriggerScriptRegeneration]),
            (StatusField::ScriptApproved, "Pending", &[]),
            (
                StatusField::VoiceGenerationStatus,
                "Completed",
                &[UpdateVoiceCompletionStatus, CheckVideoEditingEligibility],
            ),
            (StatusField::VoiceGenerationStatus, "In Progress", &[]),
            (
                StatusField::VideoEditingStatus,
                "Completed",
                &[UpdateVideoCompletionStatus, NotifyFinalCompletion],
            ),
            (StatusField::VideoEditingStatus, "Published", &[]),
            (StatusField::MainStatus, "Error", &[UpdateRelatedColumns, SyncWorkflowStatus]),
            (StatusField::MainStatus, "Anything", &[UpdateRelatedColumns, SyncWorkflowStatus]),
        ];

        for (field, new, expected) in cases {
            assert_eq!(actions_for(*field, &FieldValue::set(*new)), *expected, "{field} -> {new}");
        }
    }

    #[test]
    fn test_unset_new_value_has_no_actions_except_main_status() {
        assert!(actions_for(StatusField::ScriptApproved, &FieldValue::NotSet).is_empty());
        assert_eq!(actions_for(StatusField::MainStatus, &FieldValue::NotSet).len(), 2);
    }

    #[test]
    fn test_action_union_without_duplicates() {
        use DispatchAction::*;

        let c = change(&[
            (StatusField::VoiceGenerationStatus, "In Progress", "Completed"),
            (StatusField::VideoEditingStatus, "First Draft", "Completed"),
        ]);
        let p = plan(&c);
        assert_eq!(p.priority, Priority::Medium);
        assert_eq!(
            p.actions,
            vec![
                UpdateVoiceCompletionStatus,
                CheckVideoEditingEligibility,
                UpdateVideoCompletionStatus,
                NotifyFinalCompletion,
            ]
        );
    }

    #[test]
    fn test_concrete_approval_scenario_plan() {
        use DispatchAction::*;

        let c = change(&[
            (StatusField::MainStatus, "Processing", "Approved"),
            (StatusField::ScriptApproved, "Pending", "Approved"),
        ]);
        let p = plan(&c);
        assert_eq!(p.priority, Priority::Critical);
        assert_eq!(
            p.actions,
            vec![UpdateRelatedColumns, SyncWorkflowStatus, TriggerApprovedScriptWorkflow]
        );
    }
}
