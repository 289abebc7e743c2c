//! Configuration models for the weighted pool.

pub mod pool;

pub use pool::{PoolConfig, TaskFailurePolicy, MAX_WEIGHT_ENV, TASK_FAILURE_ENV};
