//! Tests for error types

use agent_orchestrator::core::{ExecutionError, OrchestratorError};

#[test]
fn test_duplicate_agent_error() {
    let err = OrchestratorError::DuplicateAgent("payments".to_string());
    assert_eq!(format!("{}", err), "duplicate agent: payments");
}

#[test]
fn test_unknown_task_error() {
    let err = OrchestratorError::UnknownTask("t-9".to_string());
    assert_eq!(format!("{}", err), "unknown task: t-9");
}

#[test]
fn test_unsupported_kind_error() {
    let err = OrchestratorError::UnsupportedTaskKind("MINING".to_string());
    assert_eq!(format!("{}", err), "unsupported task kind: MINING");
}

#[test]
fn test_executor_fault_error() {
    let err = ExecutionError::Fault("connection refused".to_string());
    assert_eq!(format!("{}", err), "executor fault: connection refused");
}
