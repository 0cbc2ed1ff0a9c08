//! Tests for completion polling: terminal states, poll counts, and timeouts.

use std::time::Duration;

use minerva_athena::watch::watch;
use minerva_athena::{
    ExecutionHandle, MockExecutionService, PollPolicy, QueryError, QueryState, StatusSnapshot,
};

fn fast_policy() -> PollPolicy {
    PollPolicy::fixed(Duration::from_millis(1))
}

#[tokio::test]
async fn test_returns_after_terminal_state() {
    let svc = MockExecutionService::with_script(vec![
        StatusSnapshot::of(QueryState::Queued),
        StatusSnapshot::of(QueryState::Running),
        StatusSnapshot::of(QueryState::Succeeded),
    ]);
    let handle = ExecutionHandle::new("exec-1", "SELECT 1");

    let done = watch(&svc, &handle, &fast_policy()).await.unwrap();

    assert_eq!(done, handle);
    // One status fetch per scripted state, nothing after SUCCEEDED.
    assert_eq!(svc.status_calls(), 3);
}

#[tokio::test]
async fn test_immediate_success_polls_once() {
    let svc = MockExecutionService::succeeding();
    let handle = ExecutionHandle::new("exec-1", "SELECT 1");

    watch(&svc, &handle, &fast_policy()).await.unwrap();
    assert_eq!(svc.status_calls(), 1);
}

#[tokio::test]
async fn test_failed_execution_quotes_query_and_reason() {
    let svc = MockExecutionService::with_script(vec![StatusSnapshot::with_reason(
        QueryState::Failed,
        "Insufficient permissions",
    )]);
    let handle = ExecutionHandle::new("exec-1", "SELECT * FROM forbidden_table");

    let err = watch(&svc, &handle, &fast_policy()).await.unwrap_err();

    assert!(matches!(
        err,
        QueryError::ExecutionFailed {
            state: QueryState::Failed,
            ..
        }
    ));
    let message = err.to_string();
    assert!(message.contains("SELECT * FROM forbidden_table"));
    assert!(message.contains("FAILED"));
    assert!(message.contains("Insufficient permissions"));
}

#[tokio::test]
async fn test_cancelled_execution_is_an_error() {
    let svc =
        MockExecutionService::with_script(vec![StatusSnapshot::of(QueryState::Cancelled)]);
    let handle = ExecutionHandle::new("exec-1", "SELECT 1");

    let err = watch(&svc, &handle, &fast_policy()).await.unwrap_err();

    assert!(matches!(
        err,
        QueryError::ExecutionFailed {
            state: QueryState::Cancelled,
            ..
        }
    ));
    // No reason supplied by the service.
    assert!(err.to_string().contains("unknown"));
}

#[tokio::test]
async fn test_wait_budget_cancels_and_times_out() {
    // The script never leaves QUEUED.
    let svc = MockExecutionService::with_script(vec![StatusSnapshot::of(QueryState::Queued)]);
    let handle = ExecutionHandle::new("exec-slow", "SELECT 1");
    let policy = fast_policy().with_max_wait(Duration::ZERO);

    let err = watch(&svc, &handle, &policy).await.unwrap_err();

    assert!(matches!(
        err,
        QueryError::Timeout { ref execution_id, .. } if execution_id == "exec-slow"
    ));
    assert_eq!(svc.cancel_calls(), 1);
}
