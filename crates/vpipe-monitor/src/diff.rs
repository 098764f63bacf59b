//! Snapshot differ.

use std::collections::BTreeMap;

use vpipe_models::{FieldTransition, SnapshotSet, StatusChange, StatusField, VideoStatusSnapshot};

use crate::suppression::is_automated;

/// Compare a fresh snapshot set against the cached one.
///
/// Only videos present in both sets are compared; new and removed videos
/// produce nothing. Transitions in the automated table are dropped, and a
/// video whose every transition was dropped yields no entry. Results follow
/// the ID order of `current`.
pub fn diff(current: &SnapshotSet, cached: &SnapshotSet) -> Vec<StatusChange> {
    current
        .iter()
        .filter_map(|now| {
            let before = cached.get(&now.video_id)?;
            diff_video(before, now)
        })
        .collect()
}

/// Compare two rows of the same video.
pub fn diff_video(
    before: &VideoStatusSnapshot,
    now: &VideoStatusSnapshot,
) -> Option<StatusChange> {
    let mut changes = BTreeMap::new();

    for field in StatusField::ALL {
        let old = before.value(field);
        let new = now.value(field);
        if old == new {
            continue;
        }

        let transition = FieldTransition {
            old: old.clone(),
            new: new.clone(),
        };
        if is_automated(field, &transition) {
            continue;
        }
        changes.insert(field, transition);
    }

    if changes.is_empty() {
        return None;
    }

    Some(StatusChange {
        video_id: now.video_id.clone(),
        title: now.title.clone(),
        changes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suppression::AUTOMATED_TRANSITIONS;
    use vpipe_models::{FieldValue, VideoId};

    fn row(n: u32) -> VideoStatusSnapshot {
        VideoStatusSnapshot::new(VideoId::from_number(n), format!("Video {n}"))
            .with(StatusField::MainStatus, "Processing")
            .with(StatusField::ScriptApproved, "Pending")
            .with(StatusField::VoiceGenerationStatus, "Not Ready")
            .with(StatusField::VideoEditingStatus, "Not Ready")
    }

    fn set(rows: Vec<VideoStatusSnapshot>) -> SnapshotSet {
        rows.into_iter().collect()
    }

    #[test]
    fn test_diff_of_identical_sets_is_empty() {
        let current = set(vec![row(1), row(2), row(3).with(StatusField::MainStatus, FieldValue::NotSet)]);
        assert!(diff(&current, &current).is_empty());
    }

    #[test]
    fn test_new_video_is_silent() {
        let current = set(vec![VideoStatusSnapshot::new(VideoId::from_number(99), "Fresh upload")
            .with(StatusField::MainStatus, "New")]);
        assert!(diff(&current, &SnapshotSet::new()).is_empty());
    }

    #[test]
    fn test_first_run_with_empty_cache_reports_nothing() {
        let current = set((1..=20).map(row).collect());
        assert!(diff(&current, &SnapshotSet::new()).is_empty());
    }

    #[test]
    fn test_removed_video_is_ignored() {
        let cached = set(vec![row(1), row(2)]);
        let current = set(vec![row(1)]);
        assert!(diff(&current, &cached).is_empty());
    }

    #[test]
    fn test_each_automated_transition_alone_is_suppressed() {
        for (field, old, new) in AUTOMATED_TRANSITIONS {
            let cached = set(vec![row(5).with(*field, *old)]);
            let current = set(vec![row(5).with(*field, *new)]);
            assert!(
                diff(&current, &cached).is_empty(),
                "{field} {old} -> {new} should be suppressed"
            );
        }
    }

    #[test]
    fn test_suppressed_and_reported_fields_in_one_video() {
        let cached = set(vec![row(7)]);
        let current = set(vec![row(7)
            .with(StatusField::VoiceGenerationStatus, "Not Started")
            .with(StatusField::ScriptApproved, "Approved")]);

        let changes = diff(&current, &cached);
        assert_eq!(changes.len(), 1);
        assert!(changes[0].has(StatusField::ScriptApproved));
        assert!(!changes[0].has(StatusField::VoiceGenerationStatus));
    }

    #[test]
    fn test_additivity_across_videos() {
        let cached = set(vec![row(1), row(2), row(3)]);
        let current = set(vec![
            row(1).with(StatusField::MainStatus, "Error"),
            row(2).with(StatusField::ScriptApproved, "Needs Changes"),
            row(3),
        ]);

        let changes = diff(&current, &cached);
        assert_eq!(changes.len(), 2);

        assert_eq!(changes[0].video_id, VideoId::from_number(1));
        assert_eq!(changes[0].fields().collect::<Vec<_>>(), vec![StatusField::MainStatus]);

        assert_eq!(changes[1].video_id, VideoId::from_number(2));
        assert_eq!(changes[1].fields().collect::<Vec<_>>(), vec![StatusField::ScriptApproved]);
    }

    #[test]
    fn test_unset_is_distinct_from_any_value() {
        let cached = set(vec![row(4).with(StatusField::VideoEditingStatus, FieldValue::NotSet)]);
        let current = set(vec![row(4).with(StatusField::VideoEditingStatus, "")]);

        let changes = diff(&current, &cached);
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0].get(StatusField::VideoEditingStatus),
            Some(&FieldTransition::new(FieldValue::NotSet, ""))
        );
    }

    #[test]
    fn test_unknown_labels_are_still_diffed() {
        let cached = set(vec![row(8).with(StatusField::MainStatus, "On Hold")]);
        let current = set(vec![row(8).with(StatusField::MainStatus, "Paused")]);
        assert_eq!(diff(&current, &cached).len(), 1);
    }

    #[test]
    fn test_concrete_approval_scenario() {
        let base = |main: &str, script: &str| {
            VideoStatusSnapshot::new(VideoId::from_number(1), "Launch video")
                .with(StatusField::MainStatus, main)
                .with(StatusField::ScriptApproved, script)
                .with(StatusField::VoiceGenerationStatus, "Not Started")
                .with(StatusField::VideoEditingStatus, "")
        };
        let cached = set(vec![base("Processing", "Pending")]);
        let current = set(vec![base("Approved", "Approved")]);

        let changes = diff(&current, &cached);
        assert_eq!(changes.len(), 1);

        let change = &changes[0];
        assert_eq!(change.video_id.as_str(), "VID-0001");
        assert_eq!(change.changes.len(), 2);
        assert_eq!(
            change.get(StatusField::MainStatus),
            Some(&FieldTransition::new("Processing", "Approved"))
        );
        assert_eq!(
            change.get(StatusField::ScriptApproved),
            Some(&FieldTransition::new("Pending", "Approved"))
        );
    }
}
