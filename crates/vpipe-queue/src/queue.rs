//! Workflow queue using Redis Streams.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, info};

use vpipe_monitor::{CollaboratorError, WorkflowRequest, WorkflowTrigger};

use crate::error::{QueueError, QueueResult};
use crate::job::WorkflowJob;

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// Stream the pipeline consumes continuation jobs from
    pub stream_name: String,
    /// Prefix for dedup keys
    pub dedup_prefix: String,
    /// How long an enqueued job blocks identical ones
    pub dedup_ttl: Duration,
    /// Approximate stream length cap
    pub max_stream_len: usize,
    /// Key holding the persisted snapshot cache
    pub snapshot_key: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            stream_name: "vpipe:workflows".to_string(),
            dedup_prefix: "vpipe:dedup".to_string(),
            dedup_ttl: Duration::from_secs(900),
            max_stream_len: 10_000,
            snapshot_key: "vpipe:snapshot_cache".to_string(),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            stream_name: std::env::var("WORKFLOW_STREAM").unwrap_or(defaults.stream_name),
            dedup_prefix: std::env::var("WORKFLOW_DEDUP_PREFIX").unwrap_or(defaults.dedup_prefix),
            dedup_ttl: std::env::var("WORKFLOW_DEDUP_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.dedup_ttl),
            max_stream_len: std::env::var("WORKFLOW_STREAM_MAXLEN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_stream_len),
            snapshot_key: std::env::var("SNAPSHOT_CACHE_KEY").unwrap_or(defaults.snapshot_key),
        }
    }

    fn dedup_key(&self, idempotency_key: &str) -> String {
        format!("{}:{}", self.dedup_prefix, idempotency_key)
    }
}

/// What happened to an enqueue call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Added with this stream message ID.
    Enqueued(String),
    /// An identical job is already queued.
    Duplicate,
}

/// Workflow queue client.
#[derive(Clone)]
pub struct WorkflowQueue {
    client: redis::Client,
    config: QueueConfig,
}

impl WorkflowQueue {
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub(crate) fn client(&self) -> &redis::Client {
        &self.client
    }

    /// Check the connection.
    pub async fn ping(&self) -> QueueResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(())
    }

    /// Enqueue a job unless an identical one was enqueued within the dedup TTL.
    pub async fn enqueue(&self, job: &WorkflowJob) -> QueueResult<EnqueueOutcome> {
        let mut conn = self.connection().await?;

        let payload = serde_json::to_string(job)?;
        let idempotency_key = job.idempotency_key();
        let dedup_key = self.config.dedup_key(&idempotency_key);

        // SET NX claims the key atomically; a nil reply means it was taken.
        let claimed: Option<String> = redis::cmd("SET")
            .arg(&dedup_key)
            .arg(job.job_id.to_string())
            .arg("NX")
            .arg("EX")
            .arg(self.config.dedup_ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;

        if claimed.is_none() {
            debug!(key = %idempotency_key, "Duplicate workflow job skipped");
            return Ok(EnqueueOutcome::Duplicate);
        }

        let added: Result<String, redis::RedisError> = redis::cmd("XADD")
            .arg(&self.config.stream_name)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.config.max_stream_len)
            .arg("*")
            .arg("job")
            .arg(&payload)
            .arg("key")
            .arg(&idempotency_key)
            .query_async(&mut conn)
            .await;

        let message_id = match added {
            Ok(id) => id,
            Err(e) => {
                // Release the claim so the next cycle can try again.
                let _: Result<(), _> = conn.del(&dedup_key).await;
                return Err(QueueError::Redis(e));
            }
        };

        info!(
            job_id = %job.job_id,
            video_id = %job.video_id(),
            workflow = job.request.name(),
            message_id = %message_id,
            "Enqueued workflow job"
        );

        Ok(EnqueueOutcome::Enqueued(message_id))
    }

    /// Get queue length.
    pub async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.connection().await?;
        let len: u64 = conn.xlen(&self.config.stream_name).await?;
        Ok(len)
    }

    async fn connection(&self) -> QueueResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| QueueError::connection_failed(e.to_string()))
    }
}

#[async_trait]
impl WorkflowTrigger for WorkflowQueue {
    async fn trigger(&self, request: &WorkflowRequest) -> Result<(), CollaboratorError> {
        let job = WorkflowJob::new(request.clone());
        // A duplicate means the continuation is already queued.
        self.enqueue(&job)
            .await
            .map(|_| ())
            .map_err(QueueError::into_workflow_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_config_defaults() {
        let config = QueueConfig::default();
        assert_eq!(config.stream_name, "vpipe:workflows");
        assert_eq!(config.dedup_ttl, Duration::from_secs(900));
        assert_eq!(config.dedup_key("sync_status:VID-0001:Error"), "vpipe:dedup:sync_status:VID-0001:Error");
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        std::env::set_var("WORKFLOW_STREAM", "pipeline:continuations");
        std::env::set_var("WORKFLOW_DEDUP_TTL_SECS", "60");
        std::env::set_var("SNAPSHOT_CACHE_KEY", "pipeline:cache");
        std::env::set_var("WORKFLOW_STREAM_MAXLEN", "oops");

        let config = QueueConfig::from_env();

        assert_eq!(config.stream_name, "pipeline:continuations");
        assert_eq!(config.dedup_ttl, Duration::from_secs(60));
        assert_eq!(config.snapshot_key, "pipeline:cache");
        assert_eq!(config.max_stream_len, 10_000);

        std::env::remove_var("WORKFLOW_STREAM");
        std::env::remove_var("WORKFLOW_DEDUP_TTL_SECS");
        std::env::remove_var("SNAPSHOT_CACHE_KEY");
        std::env::remove_var("WORKFLOW_STREAM_MAXLEN");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(WorkflowQueue::new(QueueConfig {
            redis_url: "not a url".into(),
            ..Default::default()
        })
        .is_err());
    }

    #[tokio::test]
    async fn test_unreachable_redis_is_retryable_workflow_error() {
        let queue = WorkflowQueue::new(QueueConfig {
            redis_url: "redis://127.0.0.1:1".into(),
            ..Default::default()
        })
        .unwrap();

        let err = queue
            .trigger(&WorkflowRequest::RegenerateScript {
                video_id: vpipe_models::VideoId::from_number(1),
                title: "x".into(),
                cause: vpipe_monitor::TriggerCause::new(
                    vpipe_models::StatusField::ScriptApproved,
                    &vpipe_models::FieldTransition::new("Pending", "Needs Changes"),
                    None,
                ),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind, vpipe_monitor::CollaboratorKind::Workflow);
        assert!(err.retryable);
    }
}
