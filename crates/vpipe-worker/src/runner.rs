//! Scheduler loop.
//!
//! The runner owns the snapshot cache. It restores it from Redis at start,
//! runs one poll cycle per tick under the cycle timeout, and saves the cache
//! whenever a cycle advanced it.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn, Instrument};

use vpipe_monitor::{
    CycleReport, Dispatcher, Notifier, PollCycle, SnapshotCache, SnapshotStore,
};
use vpipe_queue::{RedisSnapshotStore, WorkflowQueue};
use vpipe_sheets::{SheetsClient, VideoSheet};
use vpipe_telegram::{LoggingNotifier, TelegramClient, TelegramConfig, TelegramNotifier};

use crate::config::PollConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::CycleLogger;
use crate::metrics::{record_cache_save, record_cycle_timeout};

/// Runs poll cycles on a fixed interval.
pub struct PollRunner {
    cycle: PollCycle,
    store: Option<Arc<dyn SnapshotStore>>,
    config: PollConfig,
    cache: SnapshotCache,
    ticks: u64,
}

impl PollRunner {
    pub fn new(cycle: PollCycle, store: Option<Arc<dyn SnapshotStore>>, config: PollConfig) -> Self {
        Self {
            cycle,
            store,
            config,
            cache: SnapshotCache::new(),
            ticks: 0,
        }
    }

    /// Wire the production collaborators from environment variables.
    pub async fn from_env(config: PollConfig) -> WorkerResult<Self> {
        let sheet = Arc::new(VideoSheet::new(SheetsClient::from_env().await?));

        let notifier: Arc<dyn Notifier> = match TelegramConfig::from_env()? {
            Some(telegram) => {
                info!(chat_id = %telegram.chat_id, "Telegram notifications enabled");
                Arc::new(TelegramNotifier::new(TelegramClient::new(telegram)?))
            }
            None => {
                warn!("Telegram not configured, notifications are only logged");
                Arc::new(LoggingNotifier)
            }
        };

        let queue = WorkflowQueue::from_env()?;
        queue.ping().await?;
        info!(stream = %queue.config().stream_name, "Connected to workflow queue");

        let store: Option<Arc<dyn SnapshotStore>> = if config.persist_cache {
            Some(Arc::new(RedisSnapshotStore::for_queue(&queue)))
        } else {
            None
        };

        let dispatcher = Dispatcher::new(
            sheet.clone(),
            notifier,
            Arc::new(queue),
            config.dispatcher_config(),
        );
        let cycle = PollCycle::new(sheet, dispatcher, config.cycle_config());

        Ok(Self::new(cycle, store, config))
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Load the persisted cache, if any. Failures leave the cache empty.
    pub async fn restore(&mut self) {
        let Some(store) = &self.store else {
            return;
        };

        match store.load().await {
            Ok(Some(snapshots)) => {
                info!(videos = snapshots.len(), "Restored snapshot cache");
                self.cache = SnapshotCache::with_snapshots(snapshots);
            }
            Ok(None) => info!("No snapshot cache to restore, the first cycle primes it"),
            Err(e) => warn!(error = %e, "Failed to restore snapshot cache, starting empty"),
        }
    }

    /// Run one cycle under the cycle timeout.
    ///
    /// A timed-out cycle is abandoned with the cache as it was before it
    /// started.
    pub async fn tick(&mut self) -> WorkerResult<CycleReport> {
        self.ticks += 1;
        let logger = CycleLogger::new(self.ticks, self.config.cache_policy);
        let span = logger.create_span();

        async {
            logger.log_start(self.cache.snapshots().len());

            let outcome =
                tokio::time::timeout(self.config.cycle_timeout, self.cycle.run(&mut self.cache)).await;

            let report = match outcome {
                Ok(Ok(report)) => report,
                Ok(Err(e)) => {
                    logger.log_error(&e.to_string());
                    return Err(WorkerError::from(e));
                }
                Err(_) => {
                    record_cycle_timeout();
                    let err = WorkerError::CycleTimeout(self.config.cycle_timeout);
                    logger.log_error(&err.to_string());
                    return Err(err);
                }
            };

            logger.log_report(&report);
            if report.cache_updated {
                self.persist(&logger).await;
            }
            Ok(report)
        }
        .instrument(span)
        .await
    }

    async fn persist(&self, logger: &CycleLogger) {
        let Some(store) = &self.store else {
            return;
        };

        match store.save(self.cache.snapshots()).await {
            Ok(()) => record_cache_save(true),
            Err(e) => {
                record_cache_save(false);
                logger.log_warning(&format!("snapshot cache not saved: {e}"));
            }
        }
    }

    /// Tick until `shutdown` flips or its sender is dropped.
    ///
    /// Missed ticks are delayed rather than bursted. A cycle in flight when
    /// shutdown arrives runs to completion.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            cycle_timeout_secs = self.config.cycle_timeout.as_secs(),
            cache_policy = %self.config.cache_policy,
            persist_cache = self.store.is_some(),
            "Starting poll loop"
        );

        self.restore().await;

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            if *shutdown.borrow() {
                break;
            }

            // Failures are logged by the tick; the next tick retries.
            let _ = self.tick().await;
        }

        info!(ticks = self.ticks, "Poll loop stopped");
    }
}
