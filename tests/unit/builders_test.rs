//! Tests for builder modules

use weighted_task_pool::builders::PoolBuilder;
use weighted_task_pool::config::{PoolConfig, TaskFailurePolicy};
use weighted_task_pool::core::{Decision, PoolError, WeightedTask};

#[test]
fn test_pool_builder_config() {
    let builder = PoolBuilder::new(PoolConfig::new(100));
    assert_eq!(builder.config().max_weight, 100);
}

#[test]
fn test_pool_builder_from_json_invalid() {
    let err = PoolBuilder::from_json_str(r#"{ "max_weight": 0 }"#).unwrap_err();
    assert!(matches!(err, PoolError::InvalidConfiguration(_)));
}

#[tokio::test]
async fn test_pool_builder_applies_policy() {
    let builder = PoolBuilder::from_json_str(r#"{ "max_weight": 4, "task_failure": "fail_run" }"#)
        .unwrap();
    let mut pending = vec![3u64, 1];
    let pool = builder
        .build(move |_: u64| match pending.pop() {
            Some(w) => Decision::single(WeightedTask::infallible(w, async move { w })),
            None => Decision::Exhausted,
        })
        .unwrap();

    assert_eq!(pool.max_weight(), 4);
    assert_eq!(pool.failure_policy(), TaskFailurePolicy::FailRun);

    let out = pool.run().unwrap().await.unwrap();
    let mut results = out.results;
    results.sort_unstable();
    assert_eq!(results, vec![1, 3]);
}
