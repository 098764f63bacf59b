//! One poll cycle: fetch, diff, dispatch, advance the cache.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use vpipe_models::{DispatchResult, SnapshotSet, StatusChange, VideoId};

use crate::cache::SnapshotCache;
use crate::collaborators::SnapshotSource;
use crate::diff::diff;
use crate::dispatcher::Dispatcher;
use crate::error::{MonitorError, MonitorResult};
use crate::metrics::{record_change_group, record_cycle, record_tracked_videos};
use crate::rules::classify;

// =============================================================================
// Configuration
// =============================================================================

/// When the cache takes the freshly fetched snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Advance only when every dispatch in the cycle succeeded.
    #[default]
    WholeCycle,
    /// Advance every video except those with a failed action.
    PerVideo,
    /// Always advance. Failed actions are not retried.
    Always,
}

impl CachePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CachePolicy::WholeCycle => "whole_cycle",
            CachePolicy::PerVideo => "per_video",
            CachePolicy::Always => "always",
        }
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CachePolicy {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "whole_cycle" => Ok(CachePolicy::WholeCycle),
            "per_video" => Ok(CachePolicy::PerVideo),
            "always" => Ok(CachePolicy::Always),
            other => Err(MonitorError::invalid_config(format!(
                "unknown cache policy '{other}' (expected whole_cycle, per_video or always)"
            ))),
        }
    }
}

/// Poll cycle configuration.
#[derive(Debug, Clone)]
pub struct CycleConfig {
    pub cache_policy: CachePolicy,
    /// Change groups dispatched concurrently.
    pub max_parallel_groups: usize,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            cache_policy: CachePolicy::default(),
            max_parallel_groups: 4,
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// What one cycle saw and did.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub cycle_id: Uuid,
    /// Videos in the fetched snapshot.
    pub fetched: usize,
    pub changes: Vec<StatusChange>,
    pub results: Vec<DispatchResult>,
    pub cache_policy: CachePolicy,
    pub cache_updated: bool,
}

impl CycleReport {
    /// True when no action failed.
    pub fn is_success(&self) -> bool {
        self.results.iter().all(DispatchResult::is_success)
    }

    /// Videos with at least one failed action.
    pub fn failed_videos(&self) -> impl Iterator<Item = &VideoId> {
        self.results
            .iter()
            .filter(|r| !r.is_success())
            .map(|r| &r.video_id)
    }

    pub fn action_count(&self) -> usize {
        self.results.iter().map(|r| r.actions.len()).sum()
    }
}

// =============================================================================
// Cycle
// =============================================================================

/// Fetch, diff and dispatch against a caller-owned cache.
#[derive(Clone)]
pub struct PollCycle {
    source: Arc<dyn SnapshotSource>,
    dispatcher: Dispatcher,
    config: CycleConfig,
}

impl PollCycle {
    pub fn new(source: Arc<dyn SnapshotSource>, dispatcher: Dispatcher, config: CycleConfig) -> Self {
        Self {
            source,
            dispatcher,
            config,
        }
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    /// Run one cycle.
    ///
    /// A fetch failure returns an error before the differ runs and leaves
    /// `cache` untouched. Action failures are recorded in the report.
    pub async fn run(&self, cache: &mut SnapshotCache) -> MonitorResult<CycleReport> {
        let cycle_id = Uuid::new_v4();
        let span = info_span!("poll_cycle", cycle_id = %cycle_id);

        async {
            let started = Instant::now();

            let current = match self.source.fetch_all_video_snapshots().await {
                Ok(current) => current,
                Err(e) => {
                    warn!(error = %e, "Snapshot fetch failed, keeping cache");
                    record_cycle("fetch_failed", started.elapsed().as_secs_f64());
                    return Err(if matches!(e, MonitorError::Fetch(_)) {
                        e
                    } else {
                        MonitorError::fetch(e.to_string())
                    });
                }
            };
            record_tracked_videos(current.len());

            let changes = diff(&current, cache.snapshots());
            for change in &changes {
                record_change_group(classify(change), change.fields());
            }

            let groups: Vec<_> = changes
                .iter()
                .filter_map(|change| {
                    current
                        .get(&change.video_id)
                        .map(|row| (change.clone(), row.clone()))
                })
                .collect();

            let results = self
                .dispatcher
                .dispatch_all(groups, self.config.max_parallel_groups)
                .await;

            let cache_updated = advance_cache(self.config.cache_policy, cache, &current, &results);

            let report = CycleReport {
                cycle_id,
                fetched: current.len(),
                changes,
                results,
                cache_policy: self.config.cache_policy,
                cache_updated,
            };

            let elapsed = started.elapsed().as_secs_f64();
            record_cycle(if report.is_success() { "ok" } else { "partial" }, elapsed);
            info!(
                fetched = report.fetched,
                changes = report.changes.len(),
                actions = report.action_count(),
                failed_videos = report.failed_videos().count(),
                cache_updated = report.cache_updated,
                elapsed_secs = elapsed,
                "Poll cycle finished"
            );

            Ok(report)
        }
        .instrument(span)
        .await
    }
}

/// Apply `policy`, then fold each video's own sheet writes into whichever
/// row the cache now holds. Returns whether the cache changed.
fn advance_cache(
    policy: CachePolicy,
    cache: &mut SnapshotCache,
    current: &SnapshotSet,
    results: &[DispatchResult],
) -> bool {
    let advanced = match policy {
        CachePolicy::Always => {
            cache.replace(current.clone());
            true
        }
        CachePolicy::WholeCycle => {
            if results.iter().all(DispatchResult::is_success) {
                cache.replace(current.clone());
                true
            } else {
                false
            }
        }
        CachePolicy::PerVideo => {
            let held: HashSet<VideoId> = results
                .iter()
                .filter(|r| !r.is_success())
                .map(|r| r.video_id.clone())
                .collect();
            cache.replace_except(current, &held);
            true
        }
    };

    let mut folded = false;
    for result in results {
        folded |= cache.record_writes(&result.video_id, &result.applied);
    }
    advanced || folded
}
