//! Worker metrics and the Prometheus exporter.

use std::net::{Ipv4Addr, SocketAddr};

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::{WorkerError, WorkerResult};

pub mod names {
    /// Cycles abandoned at the cycle timeout.
    pub const CYCLE_TIMEOUTS_TOTAL: &str = "worker_cycle_timeouts_total";

    /// Snapshot cache saves by result.
    pub const CACHE_SAVES_TOTAL: &str = "worker_cache_saves_total";
}

/// Install the global recorder and serve `/metrics` on `port`.
pub fn install_exporter(port: u16) -> WorkerResult<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| WorkerError::Metrics(e.to_string()))
}

pub fn record_cycle_timeout() {
    counter!(names::CYCLE_TIMEOUTS_TOTAL).increment(1);
}

pub fn record_cache_save(success: bool) {
    let result = if success { "ok" } else { "error" };
    counter!(names::CACHE_SAVES_TOTAL, "result" => result).increment(1);
}
