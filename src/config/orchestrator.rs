//! Orchestrator and deployment configuration structures.

use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{AgentConfig, BackoffPolicy, HealthThresholds};

/// Prefix of environment variables read by [`OrchestratorConfig::from_env`].
pub const ENV_PREFIX: &str = "ORCHESTRATOR_";

/// Tunables for the tick loop, retries, health checks, and dispatch limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Pause between ticks in milliseconds.
    pub tick_interval_ms: u64,
    /// Pause after a faulted tick in milliseconds.
    pub error_pause_ms: u64,
    /// Backoff before the first retry in milliseconds; doubles per attempt.
    pub backoff_unit_ms: u64,
    /// Optional cap on a single backoff delay in milliseconds.
    pub max_backoff_ms: Option<u64>,
    /// Idle seconds before the health monitor flags an agent.
    pub inactivity_threshold_secs: u64,
    /// Reliability percentage under which an experienced agent is flagged.
    pub reliability_floor: f64,
    /// Outcomes an agent must exceed before the reliability floor applies.
    pub min_outcomes_for_alert: u64,
    /// Cap on concurrently supervised tasks. `None` is unbounded.
    pub max_in_flight: Option<usize>,
    /// Cap on concurrently supervised tasks per agent. `None` is unbounded.
    pub max_in_flight_per_agent: Option<u32>,
    /// Submit the next occurrence of a recurring task once it finishes.
    pub resubmit_recurring: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10_000,
            error_pause_ms: 30_000,
            backoff_unit_ms: 1_000,
            max_backoff_ms: None,
            inactivity_threshold_secs: 60 * 60,
            reliability_floor: 80.0,
            min_outcomes_for_alert: 10,
            max_in_flight: None,
            max_in_flight_per_agent: None,
            resubmit_recurring: false,
        }
    }
}

impl OrchestratorConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be greater than 0".into());
        }
        if self.error_pause_ms == 0 {
            return Err("error_pause_ms must be greater than 0".into());
        }
        if self.max_backoff_ms == Some(0) {
            return Err("max_backoff_ms must be greater than 0 when set".into());
        }
        if !(0.0..=100.0).contains(&self.reliability_floor) {
            return Err("reliability_floor must be within 0..=100".into());
        }
        if self.max_in_flight == Some(0) {
            return Err("max_in_flight must be greater than 0 when set".into());
        }
        if self.max_in_flight_per_agent == Some(0) {
            return Err("max_in_flight_per_agent must be greater than 0 when set".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `ORCHESTRATOR_*` environment variables over
    /// the defaults, loading a `.env` file first if one exists.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        let mut cfg = Self::default();
        if let Some(v) = env_var("TICK_INTERVAL_MS")? {
            cfg.tick_interval_ms = v;
        }
        if let Some(v) = env_var("ERROR_PAUSE_MS")? {
            cfg.error_pause_ms = v;
        }
        if let Some(v) = env_var("BACKOFF_UNIT_MS")? {
            cfg.backoff_unit_ms = v;
        }
        if let Some(v) = env_var("MAX_BACKOFF_MS")? {
            cfg.max_backoff_ms = Some(v);
        }
        if let Some(v) = env_var("INACTIVITY_THRESHOLD_SECS")? {
            cfg.inactivity_threshold_secs = v;
        }
        if let Some(v) = env_var("RELIABILITY_FLOOR")? {
            cfg.reliability_floor = v;
        }
        if let Some(v) = env_var("MIN_OUTCOMES_FOR_ALERT")? {
            cfg.min_outcomes_for_alert = v;
        }
        if let Some(v) = env_var("MAX_IN_FLIGHT")? {
            cfg.max_in_flight = Some(v);
        }
        if let Some(v) = env_var("MAX_IN_FLIGHT_PER_AGENT")? {
            cfg.max_in_flight_per_agent = Some(v);
        }
        if let Some(v) = env_var("RESUBMIT_RECURRING")? {
            cfg.resubmit_recurring = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Pause between ticks.
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Pause after a faulted tick.
    pub const fn error_pause(&self) -> Duration {
        Duration::from_millis(self.error_pause_ms)
    }

    /// Retry backoff derived from the config.
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            unit: Duration::from_millis(self.backoff_unit_ms),
            max_delay: self.max_backoff_ms.map(Duration::from_millis),
        }
    }

    /// Health monitor thresholds derived from the config.
    pub const fn health_thresholds(&self) -> HealthThresholds {
        HealthThresholds {
            inactivity: Duration::from_secs(self.inactivity_threshold_secs),
            reliability_floor: self.reliability_floor,
            min_outcomes: self.min_outcomes_for_alert,
        }
    }
}

fn env_var<T: FromStr>(suffix: &str) -> Result<Option<T>, String>
where
    T::Err: std::fmt::Display,
{
    let key = format!("{ENV_PREFIX}{suffix}");
    match std::env::var(&key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| format!("{key}: {e}")),
        Err(_) => Ok(None),
    }
}

/// Orchestrator settings together with the agents to register at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Orchestrator tunables.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Agents registered when the scheduler is built.
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

impl DeploymentConfig {
    /// Validate the orchestrator settings and every agent, rejecting duplicate ids.
    pub fn validate(&self) -> Result<(), String> {
        self.orchestrator
            .validate()
            .map_err(|e| format!("orchestrator invalid: {e}"))?;
        let mut seen = HashSet::new();
        for agent in &self.agents {
            agent
                .validate()
                .map_err(|e| format!("agent `{}` invalid: {e}", agent.id))?;
            if !seen.insert(agent.id.as_str()) {
                return Err(format!("agent `{}` defined more than once", agent.id));
            }
        }
        Ok(())
    }

    /// Parse a deployment from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
