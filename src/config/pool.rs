//! Pool configuration structures.

use std::env;

use serde::{Deserialize, Serialize};

/// Environment variable holding the weight budget.
pub const MAX_WEIGHT_ENV: &str = "WEIGHTED_POOL_MAX_WEIGHT";
/// Environment variable holding the task failure policy (`drop` or `fail_run`).
pub const TASK_FAILURE_ENV: &str = "WEIGHTED_POOL_TASK_FAILURE";

/// What a run does when an admitted task fails or panics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFailurePolicy {
    /// Log and count the failure, release its weight and keep going.
    #[default]
    Drop,
    /// Stop asking the supplier, let in-flight tasks drain, then fail the run
    /// with the first failure.
    FailRun,
}

impl TaskFailurePolicy {
    fn parse(input: &str) -> Result<Self, String> {
        match input.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "fail_run" | "fail-run" => Ok(Self::FailRun),
            other => Err(format!("unknown task failure policy `{other}`")),
        }
    }
}

/// Pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Budget for the summed weight of in-flight tasks.
    pub max_weight: u64,
    /// Behaviour on task failure.
    #[serde(default)]
    pub task_failure: TaskFailurePolicy,
}

impl PoolConfig {
    /// Config with the given budget and the default failure policy.
    #[must_use]
    pub fn new(max_weight: u64) -> Self {
        Self {
            max_weight,
            task_failure: TaskFailurePolicy::default(),
        }
    }

    /// Set the failure policy.
    #[must_use]
    pub const fn with_task_failure(mut self, policy: TaskFailurePolicy) -> Self {
        self.task_failure = policy;
        self
    }

    /// Validate pool configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_weight == 0 {
            return Err("max_weight must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse pool configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the process environment, reading a `.env`
    /// file first when one is present.
    pub fn from_env() -> Result<Self, String> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(format!("failed to load .env: {e}"));
            }
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<L>(lookup: L) -> Result<Self, String>
    where
        L: Fn(&str) -> Option<String>,
    {
        let raw = lookup(MAX_WEIGHT_ENV).ok_or_else(|| format!("{MAX_WEIGHT_ENV} is not set"))?;
        let max_weight = raw
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("{MAX_WEIGHT_ENV}: {e}"))?;
        let task_failure = match lookup(TASK_FAILURE_ENV) {
            Some(raw) => TaskFailurePolicy::parse(&raw)?,
            None => TaskFailurePolicy::default(),
        };
        let cfg = Self {
            max_weight,
            task_failure,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_lookup_reads_budget_and_policy() {
        let cfg = PoolConfig::from_lookup(lookup(&[
            (MAX_WEIGHT_ENV, " 64 "),
            (TASK_FAILURE_ENV, "fail-run"),
        ]))
        .unwrap();
        assert_eq!(cfg.max_weight, 64);
        assert_eq!(cfg.task_failure, TaskFailurePolicy::FailRun);
    }

    #[test]
    fn env_lookup_defaults_policy() {
        let cfg = PoolConfig::from_lookup(lookup(&[(MAX_WEIGHT_ENV, "8")])).unwrap();
        assert_eq!(cfg.task_failure, TaskFailurePolicy::Drop);
    }

    #[test]
    fn env_lookup_rejects_zero_and_garbage() {
        assert!(PoolConfig::from_lookup(lookup(&[(MAX_WEIGHT_ENV, "0")])).is_err());
        assert!(PoolConfig::from_lookup(lookup(&[(MAX_WEIGHT_ENV, "-3")])).is_err());
        assert!(PoolConfig::from_lookup(lookup(&[])).is_err());
        assert!(PoolConfig::from_lookup(lookup(&[
            (MAX_WEIGHT_ENV, "8"),
            (TASK_FAILURE_ENV, "retry"),
        ]))
        .is_err());
    }
}
