//! Poller configuration.

use std::time::Duration;

use vpipe_monitor::{CachePolicy, CycleConfig, DispatcherConfig};

use crate::error::{WorkerError, WorkerResult};

/// Poller configuration.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Time between cycle starts
    pub interval: Duration,
    /// Upper bound on one cycle; a cycle that overruns counts as failed
    pub cycle_timeout: Duration,
    /// Change groups dispatched concurrently
    pub max_parallel_groups: usize,
    /// When the snapshot cache advances
    pub cache_policy: CachePolicy,
    /// Send a change report for every dispatched group
    pub change_reports: bool,
    /// Load the cache from Redis at start and save it after each cycle
    pub persist_cache: bool,
    /// Port for the Prometheus exporter, disabled when unset
    pub metrics_port: Option<u16>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            cycle_timeout: Duration::from_secs(300),
            max_parallel_groups: 4,
            cache_policy: CachePolicy::WholeCycle,
            change_reports: true,
            persist_cache: true,
            metrics_port: None,
        }
    }
}

impl PollConfig {
    /// Create config from environment variables.
    ///
    /// Unparseable numbers fall back to their defaults. An unknown
    /// `POLL_CACHE_POLICY` is an error.
    pub fn from_env() -> WorkerResult<Self> {
        let defaults = Self::default();

        let cache_policy = match std::env::var("POLL_CACHE_POLICY") {
            Ok(raw) if !raw.trim().is_empty() => raw
                .parse()
                .map_err(|e: vpipe_monitor::MonitorError| WorkerError::config_error(e.to_string()))?,
            _ => defaults.cache_policy,
        };

        let config = Self {
            interval: Duration::from_secs(
                std::env::var("POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            cycle_timeout: Duration::from_secs(
                std::env::var("POLL_CYCLE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            max_parallel_groups: std::env::var("POLL_MAX_PARALLEL_GROUPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_parallel_groups),
            cache_policy,
            change_reports: std::env::var("POLL_CHANGE_REPORTS")
                .ok()
                .and_then(|s| parse_bool(&s))
                .unwrap_or(defaults.change_reports),
            persist_cache: std::env::var("POLL_PERSIST_CACHE")
                .ok()
                .and_then(|s| parse_bool(&s))
                .unwrap_or(defaults.persist_cache),
            metrics_port: std::env::var("METRICS_PORT")
                .ok()
                .and_then(|s| s.parse().ok()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> WorkerResult<()> {
        if self.interval.is_zero() {
            return Err(WorkerError::config_error("POLL_INTERVAL_SECS must be positive"));
        }
        if self.cycle_timeout.is_zero() {
            return Err(WorkerError::config_error("POLL_CYCLE_TIMEOUT_SECS must be positive"));
        }
        if self.max_parallel_groups == 0 {
            return Err(WorkerError::config_error("POLL_MAX_PARALLEL_GROUPS must be at least 1"));
        }
        Ok(())
    }

    pub fn cycle_config(&self) -> CycleConfig {
        CycleConfig {
            cache_policy: self.cache_policy,
            max_parallel_groups: self.max_parallel_groups,
        }
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            change_reports: self.change_reports,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
