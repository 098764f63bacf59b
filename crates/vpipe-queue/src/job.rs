//! Workflow continuation jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vpipe_models::VideoId;
use vpipe_monitor::WorkflowRequest;

/// A workflow request as stored on the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowJob {
    /// Unique job ID
    pub job_id: Uuid,
    /// The continuation to run
    #[serde(flatten)]
    pub request: WorkflowRequest,
    pub enqueued_at: DateTime<Utc>,
}

impl WorkflowJob {
    pub fn new(request: WorkflowRequest) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            request,
            enqueued_at: Utc::now(),
        }
    }

    pub fn video_id(&self) -> &VideoId {
        self.request.video_id()
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        self.request.idempotency_key()
    }
}
