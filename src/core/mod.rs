//! Core pool abstractions and weight accounting.

pub mod error;
pub mod executor;
pub mod task;
pub mod weighted_pool;

pub use error::{PoolError, TaskResult};
pub use executor::{Spawn, Supplier};
pub use task::{Decision, TaskFuture, WeightedTask};
pub use weighted_pool::{PoolResults, PoolRun, RunStats, WeightedPool};
