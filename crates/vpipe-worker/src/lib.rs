//! Sheet status poller.
//!
//! This crate provides:
//! - Poll configuration from the environment
//! - Collaborator wiring (sheet, Telegram, Redis workflow queue)
//! - The scheduler loop that owns the snapshot cache
//! - Cycle-scoped structured logging

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod runner;

pub use config::PollConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::CycleLogger;
pub use runner::PollRunner;
