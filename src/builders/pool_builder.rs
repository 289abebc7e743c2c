//! Builder constructing a weighted pool from configuration.

use crate::config::PoolConfig;
use crate::core::{PoolError, WeightedPool};
#[cfg(feature = "tokio-runtime")]
use crate::runtime::TokioSpawner;

/// Builds [`WeightedPool`]s from a validated [`PoolConfig`].
#[derive(Debug, Clone)]
pub struct PoolBuilder {
    config: PoolConfig,
}

impl PoolBuilder {
    /// Builder over an explicit configuration.
    #[must_use]
    pub const fn new(config: PoolConfig) -> Self {
        Self { config }
    }

    /// Builder over configuration parsed from JSON.
    pub fn from_json_str(input: &str) -> Result<Self, PoolError> {
        PoolConfig::from_json_str(input)
            .map(Self::new)
            .map_err(PoolError::InvalidConfiguration)
    }

    /// Builder over configuration read from the environment (and `.env`).
    pub fn from_env() -> Result<Self, PoolError> {
        PoolConfig::from_env()
            .map(Self::new)
            .map_err(PoolError::InvalidConfiguration)
    }

    /// Configuration the builder applies.
    #[must_use]
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Build a pool spawning tasks with `spawner`.
    pub fn build_with_spawner<T, F, S>(
        &self,
        supplier: F,
        spawner: S,
    ) -> Result<WeightedPool<T, F, S>, PoolError> {
        self.config
            .validate()
            .map_err(|e| PoolError::InvalidConfiguration(format!("config invalid: {e}")))?;
        Ok(
            WeightedPool::with_spawner(self.config.max_weight, supplier, spawner)?
                .with_failure_policy(self.config.task_failure),
        )
    }

    /// Build a pool spawning tasks on the current tokio runtime.
    #[cfg(feature = "tokio-runtime")]
    pub fn build<T, F>(&self, supplier: F) -> Result<WeightedPool<T, F, TokioSpawner>, PoolError> {
        self.build_with_spawner(supplier, TokioSpawner::current()?)
    }
}
