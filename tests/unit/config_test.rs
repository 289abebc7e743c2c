//! Tests for configuration validation

use weighted_task_pool::config::{PoolConfig, TaskFailurePolicy};

#[test]
fn test_pool_config_validation() {
    let valid = PoolConfig::new(100);
    assert!(valid.validate().is_ok());
    assert_eq!(valid.task_failure, TaskFailurePolicy::Drop);
}

#[test]
fn test_pool_config_invalid_max_weight() {
    let invalid = PoolConfig::new(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pool_config_from_json() {
    let json = r#"{
        "max_weight": 20,
        "task_failure": "fail_run"
    }"#;

    let config = PoolConfig::from_json_str(json).unwrap();
    assert_eq!(config.max_weight, 20);
    assert_eq!(config.task_failure, TaskFailurePolicy::FailRun);
}

#[test]
fn test_pool_config_from_json_defaults_policy() {
    let config = PoolConfig::from_json_str(r#"{ "max_weight": 7 }"#).unwrap();
    assert_eq!(config.task_failure, TaskFailurePolicy::Drop);
}

#[test]
fn test_pool_config_from_json_rejects_zero() {
    let err = PoolConfig::from_json_str(r#"{ "max_weight": 0 }"#).unwrap_err();
    assert!(err.contains("max_weight"));
}

#[test]
fn test_pool_config_from_json_rejects_negative() {
    assert!(PoolConfig::from_json_str(r#"{ "max_weight": -4 }"#).is_err());
}

#[test]
fn test_pool_config_roundtrips_policy_names() {
    let config = PoolConfig::new(3).with_task_failure(TaskFailurePolicy::FailRun);
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"fail_run\""));
}
