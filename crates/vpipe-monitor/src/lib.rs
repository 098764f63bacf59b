//! Status-change detection and workflow dispatch.
//!
//! This crate provides:
//! - The snapshot differ with its automated-transition suppression table
//! - Priority classification and the `(field, new value)` action table
//! - A dispatcher that runs actions against external collaborators
//! - A poll cycle that owns nothing but takes the snapshot cache explicitly

pub mod cache;
pub mod collaborators;
pub mod cycle;
pub mod diff;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod rules;
pub mod suppression;

pub use cache::SnapshotCache;
pub use collaborators::{
    CollaboratorError, CollaboratorKind, Notification, NotificationKind, Notifier, SheetUpdater,
    SnapshotSource, SnapshotStore, TriggerCause, WorkflowRequest, WorkflowTrigger,
};
pub use cycle::{CachePolicy, CycleConfig, CycleReport, PollCycle};
pub use diff::{diff, diff_video};
pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use error::{MonitorError, MonitorResult};
pub use rules::{actions_for, classify, plan, DispatchPlan};
pub use suppression::{is_automated, AUTOMATED_TRANSITIONS};
