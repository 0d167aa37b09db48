//! Tests for audit sink

use std::sync::Arc;

use agent_orchestrator::config::OrchestratorConfig;
use agent_orchestrator::core::{
    build_audit_event, AgentConfig, AuditAction, AuditSink, AuditTrail, InMemoryAuditSink,
    Scheduler, Task, TaskKind,
};
use agent_orchestrator::util::clock::ManualClock;

use super::{NoSpawn, Succeed};

#[test]
fn test_in_memory_audit_sink() {
    let sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(
        AuditAction::Submit,
        Some("task1"),
        None,
        Some("TOKEN_DISTRIBUTION".to_string()),
        1,
    );

    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].event_id, event.event_id);
    assert_eq!(events[0].task_id.as_deref(), Some("task1"));
    assert_eq!(events[0].action, AuditAction::Submit);
}

#[test]
fn test_audit_sink_overflow() {
    let sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event(AuditAction::Submit, Some("task1"), None, None, 1));
    sink.record(build_audit_event(AuditAction::Submit, Some("task2"), None, None, 1));
    sink.record(build_audit_event(AuditAction::Submit, Some("task3"), None, None, 1));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].task_id.as_deref(), Some("task2")); // First one popped
    assert_eq!(events[1].task_id.as_deref(), Some("task3"));
}

#[test]
fn test_build_audit_event() {
    let event = build_audit_event(
        AuditAction::Complete,
        Some("task1"),
        Some("agent1"),
        Some("attempts=1".to_string()),
        1_700_000_000_000,
    );

    assert_eq!(event.event_id.len(), 36);
    assert_eq!(event.task_id.as_deref(), Some("task1"));
    assert_eq!(event.agent_id.as_deref(), Some("agent1"));
    assert_eq!(event.action.to_string(), "complete");
    assert_eq!(event.detail, Some("attempts=1".to_string()));
    assert_eq!(event.created_at_ms, 1_700_000_000_000);
}

#[test]
fn test_scheduler_emits_lifecycle_events() {
    let sink = Arc::new(InMemoryAuditSink::new(16));
    let scheduler = Scheduler::new(OrchestratorConfig::default(), Succeed, NoSpawn)
        .unwrap()
        .with_audit(sink.clone());

    scheduler
        .register_agent(
            AgentConfig::new("kyc", "KYC", 1).with_capabilities([TaskKind::KycVerification]),
        )
        .unwrap();
    scheduler
        .submit_task(Task::new("t1", TaskKind::KycVerification, "0xregistry", 0))
        .unwrap();
    scheduler.tick();
    scheduler.deactivate_agent("kyc").unwrap();

    let actions: Vec<_> = sink.events().into_iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::Register,
            AuditAction::Submit,
            AuditAction::Dispatch,
            AuditAction::Deactivate,
        ]
    );
}

#[test]
fn test_audit_trail_stamps_with_its_clock() {
    let sink = Arc::new(InMemoryAuditSink::new(4));
    let clock = ManualClock::new(42);
    let trail = AuditTrail::new(sink.clone()).with_clock(Arc::new(clock.clone()));

    trail.emit(AuditAction::Submit, Some("t1"), None, None);
    clock.set(99);
    trail.emit(AuditAction::Dispatch, Some("t1"), Some("a1"), None);

    let stamps: Vec<_> = sink.events().iter().map(|e| e.created_at_ms).collect();
    assert_eq!(stamps, vec![42, 99]);
}

#[test]
fn test_scheduler_audit_uses_scheduler_clock() {
    let start_ms = 1_700_000_000_000u64;
    let clock = ManualClock::new(start_ms);
    // sink attached before the clock is swapped in
    let sink = Arc::new(InMemoryAuditSink::new(16));
    let scheduler = Scheduler::new(OrchestratorConfig::default(), Succeed, NoSpawn)
        .unwrap()
        .with_audit(sink.clone())
        .with_clock(Arc::new(clock.clone()));

    scheduler
        .register_agent(
            AgentConfig::new("kyc", "KYC", 1).with_capabilities([TaskKind::KycVerification]),
        )
        .unwrap();
    let at = u128::from(start_ms);
    scheduler
        .submit_task(Task::new("t1", TaskKind::KycVerification, "0xregistry", at))
        .unwrap();
    clock.advance(std::time::Duration::from_secs(5));
    scheduler.tick();

    let register = &sink.events_with(AuditAction::Register)[0];
    assert_eq!(register.created_at_ms, at);
    assert_eq!(
        register.created_at_ms,
        scheduler.agent("kyc").unwrap().last_execution_ms()
    );
    let dispatch = &sink.events_with(AuditAction::Dispatch)[0];
    assert_eq!(dispatch.created_at_ms, at + 5_000);
}
