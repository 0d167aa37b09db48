//! Advisory health checks over registered agents.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::agent::Agent;

/// Thresholds for the health monitor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthThresholds {
    /// Idle time since the last recorded outcome before an agent is flagged.
    pub inactivity: Duration,
    /// Reliability percentage below which an experienced agent is flagged.
    pub reliability_floor: f64,
    /// Outcomes an agent must exceed before the reliability floor applies.
    pub min_outcomes: u64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            inactivity: Duration::from_secs(60 * 60),
            reliability_floor: 80.0,
            min_outcomes: 10,
        }
    }
}

/// A single advisory finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HealthAlert {
    /// No outcome recorded for longer than the inactivity threshold.
    Inactive {
        /// Agent identifier.
        agent_id: String,
        /// Time since the last outcome (or registration).
        idle: Duration,
    },
    /// Reliability under the floor after enough outcomes.
    LowReliability {
        /// Agent identifier.
        agent_id: String,
        /// Current reliability percentage.
        reliability: f64,
        /// Outcomes recorded so far.
        outcomes: u64,
    },
}

impl HealthAlert {
    /// Agent the alert concerns.
    pub fn agent_id(&self) -> &str {
        match self {
            Self::Inactive { agent_id, .. } | Self::LowReliability { agent_id, .. } => agent_id,
        }
    }
}

/// Read-only diagnostic pass. Findings are logged and returned, never acted on.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthMonitor {
    thresholds: HealthThresholds,
}

impl HealthMonitor {
    /// Create a monitor with the given thresholds.
    pub const fn new(thresholds: HealthThresholds) -> Self {
        Self { thresholds }
    }

    /// Thresholds in use.
    pub const fn thresholds(&self) -> &HealthThresholds {
        &self.thresholds
    }

    /// Inspect every agent and emit a `warn` event per finding.
    pub fn check(&self, agents: &[Agent], now_ms: u128) -> Vec<HealthAlert> {
        let mut alerts = Vec::new();
        for agent in agents {
            let idle_ms = now_ms.saturating_sub(agent.last_execution_ms());
            let idle = Duration::from_millis(u64::try_from(idle_ms).unwrap_or(u64::MAX));
            if idle > self.thresholds.inactivity {
                tracing::warn!(agent = agent.id(), idle_secs = idle.as_secs(), "agent inactive");
                alerts.push(HealthAlert::Inactive {
                    agent_id: agent.id().to_string(),
                    idle,
                });
            }

            if agent.reliability() < self.thresholds.reliability_floor
                && agent.executed_tasks() > self.thresholds.min_outcomes
            {
                tracing::warn!(
                    agent = agent.id(),
                    reliability = %format!("{:.2}", agent.reliability()),
                    outcomes = agent.executed_tasks(),
                    "agent success rate low"
                );
                alerts.push(HealthAlert::LowReliability {
                    agent_id: agent.id().to_string(),
                    reliability: agent.reliability(),
                    outcomes: agent.executed_tasks(),
                });
            }
        }
        alerts
    }
}
