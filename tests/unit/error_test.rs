//! Tests for error types

use weighted_task_pool::core::PoolError;

#[test]
fn test_invalid_configuration_error() {
    let err = PoolError::InvalidConfiguration("max weight must be positive".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: max weight must be positive"
    );
    assert_eq!(err.as_label(), "invalid_configuration");
}

#[test]
fn test_already_running_error() {
    let err = PoolError::AlreadyRunning;
    assert_eq!(format!("{}", err), "pool is already running");
}

#[test]
fn test_invariant_violation_error() {
    let err = PoolError::InvariantViolation("finish with current_weight=3".to_string());
    assert_eq!(
        format!("{}", err),
        "invariant violation: finish with current_weight=3"
    );
}

#[test]
fn test_task_failed_error() {
    let err = PoolError::TaskFailed("connection reset".to_string());
    assert_eq!(format!("{}", err), "task failed: connection reset");
    assert_eq!(err.as_label(), "task_failed");
}

#[test]
fn test_stalled_error() {
    let err = PoolError::Stalled;
    assert_eq!(
        format!("{}", err),
        "supplier returned wait with no tasks in flight"
    );
}
