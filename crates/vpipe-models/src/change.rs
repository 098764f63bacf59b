//! Field-level changes between two snapshots.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::status::{FieldValue, StatusField};
use crate::video::VideoId;

/// One field moving from `old` to `new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldTransition {
    pub old: FieldValue,
    pub new: FieldValue,
}

impl FieldTransition {
    pub fn new(old: impl Into<FieldValue>, new: impl Into<FieldValue>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }
}

/// Every reported transition of one video between two snapshots.
///
/// Only the differ builds these, and `changes` is never empty. They are not
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub video_id: VideoId,
    pub title: String,
    pub changes: BTreeMap<StatusField, FieldTransition>,
}

impl StatusChange {
    pub fn has(&self, field: StatusField) -> bool {
        self.changes.contains_key(&field)
    }

    pub fn get(&self, field: StatusField) -> Option<&FieldTransition> {
        self.changes.get(&field)
    }

    /// Changed fields in dispatch order.
    pub fn fields(&self) -> impl Iterator<Item = StatusField> + '_ {
        self.changes.keys().copied()
    }
}
