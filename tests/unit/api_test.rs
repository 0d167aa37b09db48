//! Tests for the request/response API surface

use agent_orchestrator::config::OrchestratorConfig;
use agent_orchestrator::core::{OrchestratorError, Scheduler, TaskKind, TaskStatus};
use agent_orchestrator::runtime::{
    health, list_agents, register_agent, submit_task, task_status, AgentRegistration,
    TaskSubmission,
};

use super::{NoSpawn, Succeed};

fn scheduler() -> Scheduler<Succeed, NoSpawn> {
    Scheduler::new(OrchestratorConfig::default(), Succeed, NoSpawn).unwrap()
}

fn registration(capabilities: &[&str]) -> AgentRegistration {
    serde_json::from_value(serde_json::json!({
        "agent_id": "token-manager",
        "agent_type": "TOKEN_MANAGEMENT",
        "priority": 1,
        "capabilities": capabilities,
        "retry_attempts": 3,
        "success_threshold": 95.0,
        "max_gas": 500000
    }))
    .unwrap()
}

#[test]
fn test_register_agent_parses_capabilities() {
    let s = scheduler();
    let id = register_agent(&s, registration(&["TOKEN_DISTRIBUTION", "COMMISSION_CALCULATION"]))
        .unwrap();
    assert_eq!(id, "token-manager");

    let agent = s.agent(&id).unwrap();
    assert!(agent.config.capabilities.contains(&TaskKind::TokenDistribution));
    assert!(agent.config.capabilities.contains(&TaskKind::CommissionCalculation));
    assert_eq!(agent.config.max_retries, 3);
    assert_eq!(agent.config.max_gas, 500_000);
}

#[test]
fn test_register_agent_rejects_unknown_capability() {
    let s = scheduler();
    let err = register_agent(&s, registration(&["TOKEN_DISTRIBUTION", "MINING"])).unwrap_err();
    assert_eq!(err, OrchestratorError::UnsupportedTaskKind("MINING".into()));
    assert!(s.agent_registry().is_empty());
}

#[test]
fn test_submit_task_defaults_execution_time_to_now() {
    let s = scheduler();
    let req: TaskSubmission = serde_json::from_value(serde_json::json!({
        "task_id": "dist-1",
        "task_type": "TOKEN_DISTRIBUTION",
        "target": "0xtoken",
        "data": { "recipient": "0xabc", "amount": "1000" },
        "recurring_interval_secs": 3600
    }))
    .unwrap();

    let id = submit_task(&s, req, 1_234).unwrap();
    let task = s.task(&id).unwrap();
    assert_eq!(task.execution_time_ms, 1_234);
    assert_eq!(task.kind, TaskKind::TokenDistribution);
    assert!(task.is_recurring());
    assert_eq!(task.payload.get("amount"), Some(&serde_json::json!("1000")));
}

#[test]
fn test_submit_task_rejects_unknown_type() {
    let s = scheduler();
    let req = TaskSubmission {
        task_id: "x".into(),
        task_type: "WIRE_TRANSFER".into(),
        target: "bank".into(),
        execution_time_ms: Some(0),
        data: Default::default(),
        priority: 0,
        recurring_interval_secs: None,
    };
    assert_eq!(
        submit_task(&s, req, 0),
        Err(OrchestratorError::UnsupportedTaskKind("WIRE_TRANSFER".into()))
    );
    assert!(s.task_registry().is_empty());
}

#[test]
fn test_submit_task_rejects_zero_recurrence() {
    let s = scheduler();
    let req = TaskSubmission {
        task_id: "payout".into(),
        task_type: "PAYMENT_PROCESSING".into(),
        target: "0xescrow".into(),
        execution_time_ms: None,
        data: Default::default(),
        priority: 0,
        recurring_interval_secs: Some(0),
    };
    let result = submit_task(&s, req, 1_000);
    assert!(matches!(result, Err(OrchestratorError::InvalidTask(_))));
    assert!(s.task_registry().is_empty());
}

#[test]
fn test_task_status_and_health() {
    let s = scheduler();
    register_agent(&s, registration(&["TOKEN_DISTRIBUTION"])).unwrap();
    let req = TaskSubmission {
        task_id: "dist-1".into(),
        task_type: "TOKEN_DISTRIBUTION".into(),
        target: "0xtoken".into(),
        execution_time_ms: Some(0),
        data: Default::default(),
        priority: 5,
        recurring_interval_secs: None,
    };
    submit_task(&s, req, 0).unwrap();

    let status = task_status(&s, "dist-1").unwrap();
    assert_eq!(status.status, TaskStatus::Pending);
    assert_eq!(status.assigned_agent, None);

    let h = health(&s);
    assert!(!h.ok);
    assert_eq!(h.agents, 1);
    assert_eq!(h.active_agents, 1);
    assert_eq!(h.pending, 1);

    s.tick();
    let status = task_status(&s, "dist-1").unwrap();
    assert_eq!(status.status, TaskStatus::Executing);
    assert_eq!(status.assigned_agent.as_deref(), Some("token-manager"));
    assert_eq!(health(&s).executing, 1);

    assert_eq!(
        task_status(&s, "missing").unwrap_err(),
        OrchestratorError::UnknownTask("missing".into())
    );
}

#[test]
fn test_list_agents_snapshots() {
    let s = scheduler();
    register_agent(&s, registration(&["TOKEN_DISTRIBUTION"])).unwrap();
    s.deactivate_agent("token-manager").unwrap();

    let agents = list_agents(&s);
    assert_eq!(agents.len(), 1);
    assert!(!agents[0].active);
    assert_eq!(agents[0].reliability, 100.0);
    assert_eq!(agents[0].executed_tasks, 0);

    let json = serde_json::to_value(&agents[0]).unwrap();
    assert_eq!(json["agent_type"], "TOKEN_MANAGEMENT");
}
