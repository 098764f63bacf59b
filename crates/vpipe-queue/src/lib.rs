//! Redis-backed collaborators.
//!
//! This crate provides:
//! - Workflow continuation jobs enqueued on a Redis Stream with dedup keys
//! - Persistence of the snapshot cache across restarts

pub mod error;
pub mod job;
pub mod queue;
pub mod store;

pub use error::{QueueError, QueueResult};
pub use job::WorkflowJob;
pub use queue::{EnqueueOutcome, QueueConfig, WorkflowQueue};
pub use store::RedisSnapshotStore;
