//! Structured tick logging.
//!
//! Gives every scheduler tick the same contextual fields so one cycle's
//! lines can be pulled out of the log stream.

use tracing::{error, info, warn, Span};

use vpipe_monitor::{CachePolicy, CycleReport};

/// Logger for one scheduler tick.
#[derive(Debug, Clone)]
pub struct CycleLogger {
    tick: u64,
    policy: CachePolicy,
}

impl CycleLogger {
    pub fn new(tick: u64, policy: CachePolicy) -> Self {
        Self { tick, policy }
    }

    pub fn log_start(&self, cached_videos: usize) {
        info!(
            tick = self.tick,
            cache_policy = %self.policy,
            cached_videos,
            "Poll cycle started"
        );
    }

    /// Log a finished cycle, at warn level when any action failed.
    pub fn log_report(&self, report: &CycleReport) {
        let failed: Vec<String> = report.failed_videos().map(|v| v.to_string()).collect();

        if failed.is_empty() {
            info!(
                tick = self.tick,
                cycle_id = %report.cycle_id,
                fetched = report.fetched,
                changes = report.changes.len(),
                actions = report.action_count(),
                cache_updated = report.cache_updated,
                "Poll cycle completed"
            );
        } else {
            warn!(
                tick = self.tick,
                cycle_id = %report.cycle_id,
                fetched = report.fetched,
                changes = report.changes.len(),
                failed_videos = ?failed,
                cache_updated = report.cache_updated,
                "Poll cycle completed with failed actions"
            );
        }
    }

    pub fn log_warning(&self, message: &str) {
        warn!(tick = self.tick, cache_policy = %self.policy, "Poll warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(tick = self.tick, cache_policy = %self.policy, "Poll cycle failed: {}", message);
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!("poll_tick", tick = self.tick, cache_policy = %self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_logger_fields() {
        let logger = CycleLogger::new(7, CachePolicy::Always);
        assert_eq!(logger.tick(), 7);
        logger.log_start(3);
        logger.log_warning("cache not saved");
    }
}
