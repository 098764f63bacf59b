//! Snapshot cache persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use vpipe_models::SnapshotSet;
use vpipe_monitor::{CollaboratorError, SnapshotStore};

use crate::error::{QueueError, QueueResult};
use crate::queue::WorkflowQueue;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSnapshots {
    saved_at: DateTime<Utc>,
    snapshots: SnapshotSet,
}

/// Keeps the last accepted snapshot set in one Redis key as JSON.
#[derive(Clone)]
pub struct RedisSnapshotStore {
    client: redis::Client,
    key: String,
}

impl RedisSnapshotStore {
    pub fn new(redis_url: &str, key: impl Into<String>) -> QueueResult<Self> {
        Ok(Self {
            client: redis::Client::open(redis_url)?,
            key: key.into(),
        })
    }

    /// Share the queue's Redis client and use its configured key.
    pub fn for_queue(queue: &WorkflowQueue) -> Self {
        Self {
            client: queue.client().clone(),
            key: queue.config().snapshot_key.clone(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    async fn read(&self) -> QueueResult<Option<SnapshotSet>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(&self.key).await?;

        let Some(raw) = raw else {
            debug!(key = %self.key, "No persisted snapshot cache");
            return Ok(None);
        };

        match serde_json::from_str::<PersistedSnapshots>(&raw) {
            Ok(persisted) => {
                info!(
                    key = %self.key,
                    videos = persisted.snapshots.len(),
                    saved_at = %persisted.saved_at,
                    "Loaded persisted snapshot cache"
                );
                Ok(Some(persisted.snapshots))
            }
            Err(e) => {
                // An unreadable cache is treated as absent: the first cycle re-primes it.
                warn!(key = %self.key, error = %e, "Discarding unreadable snapshot cache");
                Ok(None)
            }
        }
    }

    async fn write(&self, snapshots: &SnapshotSet) -> QueueResult<()> {
        let payload = serde_json::to_string(&PersistedSnapshots {
            saved_at: Utc::now(),
            snapshots: snapshots.clone(),
        })?;

        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(&self.key, payload).await?;
        debug!(key = %self.key, videos = snapshots.len(), "Saved snapshot cache");
        Ok(())
    }

    async fn connection(&self) -> QueueResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| QueueError::connection_failed(e.to_string()))
    }
}

#[async_trait]
impl SnapshotStore for RedisSnapshotStore {
    async fn load(&self) -> Result<Option<SnapshotSet>, CollaboratorError> {
        self.read().await.map_err(QueueError::into_store_error)
    }

    async fn save(&self, snapshots: &SnapshotSet) -> Result<(), CollaboratorError> {
        self.write(snapshots).await.map_err(QueueError::into_store_error)
    }
}
