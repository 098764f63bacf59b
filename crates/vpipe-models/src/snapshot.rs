//! Point-in-time status snapshots of tracked videos.

use std::collections::btree_map::{self, BTreeMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::{
    FieldValue, MainStatus, ScriptApproval, StatusField, VideoEditingStatus,
    VoiceGenerationStatus,
};
use crate::video::VideoId;

/// Monitored fields of one video row, captured at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatusSnapshot {
    pub video_id: VideoId,
    /// Display title; may be empty or a placeholder.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub main_status: FieldValue,
    #[serde(default)]
    pub script_approved: FieldValue,
    #[serde(default)]
    pub voice_generation_status: FieldValue,
    #[serde(default)]
    pub video_editing_status: FieldValue,
    /// Drive folder holding the generated assets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_folder_url: Option<String>,
    /// Per-video workbook with the script breakdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workbook_url: Option<String>,
    /// Advisory only. Never used to order changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_time: Option<DateTime<Utc>>,
}

impl VideoStatusSnapshot {
    /// Create a snapshot with every status unset.
    pub fn new(video_id: VideoId, title: impl Into<String>) -> Self {
        Self {
            video_id,
            title: title.into(),
            main_status: FieldValue::NotSet,
            script_approved: FieldValue::NotSet,
            voice_generation_status: FieldValue::NotSet,
            video_editing_status: FieldValue::NotSet,
            drive_folder_url: None,
            workbook_url: None,
            last_edited_time: None,
        }
    }

    /// Set one status field (builder style).
    pub fn with(mut self, field: StatusField, value: impl Into<FieldValue>) -> Self {
        *self.value_mut(field) = value.into();
        self
    }

    /// Raw value of a monitored field.
    pub fn value(&self, field: StatusField) -> &FieldValue {
        match field {
            StatusField::MainStatus => &self.main_status,
            StatusField::ScriptApproved => &self.script_approved,
            StatusField::VoiceGenerationStatus => &self.voice_generation_status,
            StatusField::VideoEditingStatus => &self.video_editing_status,
        }
    }

    fn value_mut(&mut self, field: StatusField) -> &mut FieldValue {
        match field {
            StatusField::MainStatus => &mut self.main_status,
            StatusField::ScriptApproved => &mut self.script_approved,
            StatusField::VoiceGenerationStatus => &mut self.voice_generation_status,
            StatusField::VideoEditingStatus => &mut self.video_editing_status,
        }
    }

    pub fn main_status(&self) -> Option<MainStatus> {
        self.main_status.parse()
    }

    pub fn script_approved(&self) -> Option<ScriptApproval> {
        self.script_approved.parse()
    }

    pub fn voice_generation_status(&self) -> Option<VoiceGenerationStatus> {
        self.voice_generation_status.parse()
    }

    pub fn video_editing_status(&self) -> Option<VideoEditingStatus> {
        self.video_editing_status.parse()
    }

    /// Title for messages, falling back to the ID when the cell is blank.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            self.video_id.as_str()
        } else {
            &self.title
        }
    }

    /// Apply column updates to this copy of the row.
    pub fn apply_updates(&mut self, updates: &FieldUpdates) {
        for (field, value) in updates.iter() {
            *self.value_mut(field) = FieldValue::set(value);
        }
    }
}

// =============================================================================
// Column updates
// =============================================================================

/// Status column writes for a single video row, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdates(BTreeMap<StatusField, String>);

impl FieldUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a write; a later write to the same field replaces the earlier one.
    pub fn set(&mut self, field: StatusField, value: impl Into<String>) -> &mut Self {
        self.0.insert(field, value.into());
        self
    }

    pub fn with(mut self, field: StatusField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: StatusField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatusField, &str)> {
        self.0.iter().map(|(f, v)| (*f, v.as_str()))
    }
}

// =============================================================================
// Snapshot sets
// =============================================================================

/// All tracked videos at one point in time, keyed by ID.
///
/// IDs are unique within a set. Iteration is ordered by ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<VideoStatusSnapshot>", into = "Vec<VideoStatusSnapshot>")]
pub struct SnapshotSet {
    videos: BTreeMap<VideoId, VideoStatusSnapshot>,
}

impl SnapshotSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from fetched rows.
    ///
    /// The first row for an ID wins. The IDs of dropped duplicates are
    /// returned so the caller can report them.
    pub fn from_snapshots(
        snapshots: impl IntoIterator<Item = VideoStatusSnapshot>,
    ) -> (Self, Vec<VideoId>) {
        let mut videos = BTreeMap::new();
        let mut duplicates = Vec::new();

        for snapshot in snapshots {
            match videos.entry(snapshot.video_id.clone()) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(snapshot);
                }
                btree_map::Entry::Occupied(_) => duplicates.push(snapshot.video_id),
            }
        }

        (Self { videos }, duplicates)
    }

    pub fn get(&self, video_id: &VideoId) -> Option<&VideoStatusSnapshot> {
        self.videos.get(video_id)
    }

    pub fn contains(&self, video_id: &VideoId) -> bool {
        self.videos.contains_key(video_id)
    }

    /// Insert or replace the row for a video.
    pub fn upsert(&mut self, snapshot: VideoStatusSnapshot) {
        self.videos.insert(snapshot.video_id.clone(), snapshot);
    }

    pub fn remove(&mut self, video_id: &VideoId) -> Option<VideoStatusSnapshot> {
        self.videos.remove(video_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VideoStatusSnapshot> {
        self.videos.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &VideoId> {
        self.videos.keys()
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }
}

impl From<Vec<VideoStatusSnapshot>> for SnapshotSet {
    fn from(snapshots: Vec<VideoStatusSnapshot>) -> Self {
        Self::from_snapshots(snapshots).0
    }
}

impl From<SnapshotSet> for Vec<VideoStatusSnapshot> {
    fn from(set: SnapshotSet) -> Self {
        set.videos.into_values().collect()
    }
}

impl FromIterator<VideoStatusSnapshot> for SnapshotSet {
    fn from_iter<I: IntoIterator<Item = VideoStatusSnapshot>>(iter: I) -> Self {
        Self::from_snapshots(iter).0
    }
}
