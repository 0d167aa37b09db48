//! Tests for configuration validation

use std::time::Duration;

use agent_orchestrator::config::{DeploymentConfig, OrchestratorConfig};
use agent_orchestrator::core::TaskKind;

#[test]
fn test_orchestrator_config_defaults() {
    let cfg = OrchestratorConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.tick_interval(), Duration::from_secs(10));
    assert_eq!(cfg.error_pause(), Duration::from_secs(30));
    assert_eq!(cfg.backoff_policy().delay(3), Duration::from_secs(8));
    assert_eq!(cfg.health_thresholds().inactivity, Duration::from_secs(3600));
    assert_eq!(cfg.health_thresholds().min_outcomes, 10);
}

#[test]
fn test_orchestrator_config_invalid_tick() {
    let invalid = OrchestratorConfig {
        tick_interval_ms: 0,
        ..OrchestratorConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_orchestrator_config_invalid_floor() {
    let invalid = OrchestratorConfig {
        reliability_floor: 120.0,
        ..OrchestratorConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_orchestrator_config_invalid_caps() {
    let invalid = OrchestratorConfig {
        max_in_flight_per_agent: Some(0),
        ..OrchestratorConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_orchestrator_config_from_json() {
    let json = r#"{"tick_interval_ms": 500, "max_backoff_ms": 4000}"#;
    let cfg = OrchestratorConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.tick_interval_ms, 500);
    assert_eq!(cfg.error_pause_ms, 30_000);
    assert_eq!(cfg.backoff_policy().delay(10), Duration::from_secs(4));

    assert!(OrchestratorConfig::from_json_str(r#"{"error_pause_ms": 0}"#).is_err());
    assert!(OrchestratorConfig::from_json_str("not json").is_err());
}

#[test]
fn test_orchestrator_config_from_env() {
    std::env::set_var("ORCHESTRATOR_TICK_INTERVAL_MS", "2500");
    std::env::set_var("ORCHESTRATOR_MAX_IN_FLIGHT_PER_AGENT", "4");
    let cfg = OrchestratorConfig::from_env().unwrap();
    assert_eq!(cfg.tick_interval_ms, 2_500);
    assert_eq!(cfg.max_in_flight_per_agent, Some(4));
    assert_eq!(cfg.reliability_floor, 80.0);

    std::env::set_var("ORCHESTRATOR_RESUBMIT_RECURRING", "maybe");
    assert!(OrchestratorConfig::from_env().is_err());

    std::env::remove_var("ORCHESTRATOR_TICK_INTERVAL_MS");
    std::env::remove_var("ORCHESTRATOR_MAX_IN_FLIGHT_PER_AGENT");
    std::env::remove_var("ORCHESTRATOR_RESUBMIT_RECURRING");
}

#[test]
fn test_deployment_config_from_json() {
    let json = r#"{
        "orchestrator": { "tick_interval_ms": 1000 },
        "agents": [
            {
                "id": "payments",
                "agent_type": "PAYMENT",
                "priority": 1,
                "capabilities": ["PAYMENT_PROCESSING"],
                "max_retries": 2,
                "success_threshold": 90.0,
                "max_gas": 300000
            }
        ]
    }"#;
    let cfg = DeploymentConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.orchestrator.tick_interval_ms, 1_000);
    assert_eq!(cfg.agents.len(), 1);
    assert!(cfg.agents[0].capabilities.contains(&TaskKind::PaymentProcessing));
}

#[test]
fn test_deployment_config_rejects_unknown_capability() {
    let json = r#"{
        "agents": [
            {
                "id": "a",
                "agent_type": "X",
                "priority": 1,
                "capabilities": ["MINING"],
                "max_retries": 0,
                "success_threshold": 0.0,
                "max_gas": 0
            }
        ]
    }"#;
    assert!(DeploymentConfig::from_json_str(json).is_err());
}

#[test]
fn test_deployment_config_rejects_duplicate_agents() {
    let json = r#"{
        "agents": [
            { "id": "a", "agent_type": "X", "priority": 1, "capabilities": [],
              "max_retries": 0, "success_threshold": 0.0, "max_gas": 0 },
            { "id": "a", "agent_type": "Y", "priority": 2, "capabilities": [],
              "max_retries": 0, "success_threshold": 0.0, "max_gas": 0 }
        ]
    }"#;
    let err = DeploymentConfig::from_json_str(json).unwrap_err();
    assert!(err.contains("more than once"));
}
