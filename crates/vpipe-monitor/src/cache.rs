//! The caller-owned baseline for the next diff.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use vpipe_models::{FieldUpdates, SnapshotSet, VideoId};

/// Last accepted snapshot set.
///
/// Populated at process start (empty, or loaded from a store), replaced
/// after each cycle according to the cache policy, and dropped at shutdown.
#[derive(Debug, Clone, Default)]
pub struct SnapshotCache {
    snapshots: SnapshotSet,
    updated_at: Option<DateTime<Utc>>,
    generation: u64,
}

impl SnapshotCache {
    /// Empty cache: the first cycle treats every video as new.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache seeded from a previously persisted snapshot.
    pub fn with_snapshots(snapshots: SnapshotSet) -> Self {
        Self {
            snapshots,
            updated_at: None,
            generation: 0,
        }
    }

    pub fn snapshots(&self) -> &SnapshotSet {
        &self.snapshots
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Number of times the cache has been replaced in this process.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the whole baseline.
    pub fn replace(&mut self, current: SnapshotSet) {
        self.snapshots = current;
        self.touch();
    }

    /// Take `current` as the baseline except for the `held` videos, which
    /// keep their cached row so their changes are detected again.
    pub fn replace_except(&mut self, current: &SnapshotSet, held: &HashSet<VideoId>) {
        let mut next = current.clone();
        for video_id in held {
            match self.snapshots.get(video_id) {
                Some(previous) => next.upsert(previous.clone()),
                None => {
                    next.remove(video_id);
                }
            }
        }
        self.snapshots = next;
        self.touch();
    }

    /// Fold values the monitor itself wrote into the cached row so the next
    /// diff does not report them. Returns false when the video is not cached.
    pub fn record_writes(&mut self, video_id: &VideoId, updates: &FieldUpdates) -> bool {
        if updates.is_empty() {
            return false;
        }
        match self.snapshots.get(video_id) {
            Some(row) => {
                let mut row = row.clone();
                row.apply_updates(updates);
                self.snapshots.upsert(row);
                self.touch();
                true
            }
            None => false,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
        self.generation += 1;
    }
}
