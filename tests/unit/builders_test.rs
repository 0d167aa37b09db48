//! Tests for builder modules

use std::sync::Arc;

use agent_orchestrator::builders::{build_scheduler, SchedulerBuilder};
use agent_orchestrator::config::{DeploymentConfig, OrchestratorConfig};
use agent_orchestrator::core::{AgentConfig, OrchestratorError, TaskKind};
use agent_orchestrator::util::{Clock, ManualClock};

use super::{NoSpawn, Succeed};

fn deployment() -> DeploymentConfig {
    DeploymentConfig {
        orchestrator: OrchestratorConfig::default(),
        agents: vec![
            AgentConfig::new("tokens", "TOKEN_MANAGEMENT", 2)
                .with_capabilities([TaskKind::TokenDistribution]),
            AgentConfig::new("kyc", "KYC", 1).with_capabilities([TaskKind::KycVerification]),
        ],
    }
}

#[test]
fn test_builder_registers_agents_in_order() {
    let scheduler = build_scheduler(deployment(), Succeed, NoSpawn).unwrap();
    let ids: Vec<_> = scheduler
        .agent_registry()
        .list_all()
        .iter()
        .map(|a| a.id().to_string())
        .collect();
    assert_eq!(ids, vec!["tokens", "kyc"]);
}

#[test]
fn test_builder_uses_supplied_clock() {
    let clock = ManualClock::new(42_000);
    let scheduler = SchedulerBuilder::new(deployment())
        .with_clock(Arc::new(clock.clone()))
        .build(Succeed, NoSpawn)
        .unwrap();
    assert_eq!(scheduler.agent("kyc").unwrap().last_execution_ms(), clock.now_ms());
}

#[test]
fn test_builder_rejects_duplicate_agents() {
    let mut dep = deployment();
    dep.agents.push(AgentConfig::new("kyc", "KYC", 3));
    let err = SchedulerBuilder::new(dep).build(Succeed, NoSpawn).err().unwrap();
    assert!(matches!(err, OrchestratorError::InvalidConfig(msg) if msg.contains("kyc")));
}

#[test]
fn test_builder_rejects_invalid_orchestrator_config() {
    let mut dep = deployment();
    dep.orchestrator.tick_interval_ms = 0;
    assert!(matches!(
        build_scheduler(dep, Succeed, NoSpawn),
        Err(OrchestratorError::InvalidConfig(_))
    ));
}
