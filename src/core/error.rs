//! Error types for pool operations.

use thiserror::Error;

/// Errors produced by the weighted pool.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Pool configuration was rejected at construction.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// `run` was called while a previous run on the same pool is still in progress.
    #[error("pool is already running")]
    AlreadyRunning,
    /// The control loop reached a state it can never legally be in.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// The supplier asked to wait while nothing was in flight, so no completion
    /// could ever re-enter the control loop.
    #[error("supplier returned wait with no tasks in flight")]
    Stalled,
    /// An admitted task failed and the pool is configured to fail the run.
    #[error("task failed: {0}")]
    TaskFailed(String),
    /// An admitted task panicked (or was dropped by its runtime) before settling.
    #[error("task panicked before completing")]
    TaskPanicked,
    /// No runtime was available to spawn admitted tasks on.
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl PoolError {
    /// Returns a short stable label (snake_case) for use in logs.
    #[must_use]
    pub const fn as_label(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration(_) => "invalid_configuration",
            Self::AlreadyRunning => "already_running",
            Self::InvariantViolation(_) => "invariant_violation",
            Self::Stalled => "stalled",
            Self::TaskFailed(_) => "task_failed",
            Self::TaskPanicked => "task_panicked",
            Self::Runtime(_) => "runtime",
        }
    }
}

/// Outcome of a task computation. Task bodies use anyhow so callers can attach
/// whatever context they need.
pub type TaskResult<T> = Result<T, anyhow::Error>;
