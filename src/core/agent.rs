//! Agent configuration, runtime statistics, and the reliability estimator.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::task::TaskKind;

/// Agent identifier.
pub type AgentId = String;

/// Reliability assigned to an agent before its first recorded outcome.
pub const INITIAL_RELIABILITY: f64 = 100.0;

/// Immutable agent configuration supplied at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Unique identifier.
    pub id: AgentId,
    /// Free-form type tag, e.g. `TOKEN_MANAGEMENT`.
    pub agent_type: String,
    /// Selection priority; higher is preferred.
    pub priority: i32,
    /// Task kinds this agent may execute.
    pub capabilities: BTreeSet<TaskKind>,
    /// Retries allowed after the first attempt of a task.
    pub max_retries: u32,
    /// Minimum reliability percentage for the agent to stay eligible.
    pub success_threshold: f64,
    /// External resource budget (gas limit). Opaque to scheduling.
    pub max_gas: u64,
}

impl AgentConfig {
    /// Create a config with no capabilities, no retries, and a zero threshold.
    pub fn new(id: impl Into<AgentId>, agent_type: impl Into<String>, priority: i32) -> Self {
        Self {
            id: id.into(),
            agent_type: agent_type.into(),
            priority,
            capabilities: BTreeSet::new(),
            max_retries: 0,
            success_threshold: 0.0,
            max_gas: 0,
        }
    }

    /// Add capabilities.
    #[must_use]
    pub fn with_capabilities(mut self, kinds: impl IntoIterator<Item = TaskKind>) -> Self {
        self.capabilities.extend(kinds);
        self
    }

    /// Set the retry ceiling.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the reliability threshold (percent).
    #[must_use]
    pub fn with_success_threshold(mut self, threshold: f64) -> Self {
        self.success_threshold = threshold;
        self
    }

    /// Set the gas budget.
    #[must_use]
    pub fn with_max_gas(mut self, max_gas: u64) -> Self {
        self.max_gas = max_gas;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("agent id must not be empty".into());
        }
        if !(0.0..=100.0).contains(&self.success_threshold) {
            return Err(format!(
                "success_threshold must be within 0..=100, got {}",
                self.success_threshold
            ));
        }
        Ok(())
    }
}

/// A registered worker: configuration plus running statistics.
#[derive(Debug, Clone, Serialize)]
pub struct Agent {
    /// Registration-time configuration.
    pub config: AgentConfig,
    executed_tasks: u64,
    reliability: f64,
    last_execution_ms: u128,
    active: bool,
}

impl Agent {
    /// Wrap a config; the activity clock starts at `registered_at_ms`.
    pub const fn new(config: AgentConfig, registered_at_ms: u128) -> Self {
        Self {
            config,
            executed_tasks: 0,
            reliability: INITIAL_RELIABILITY,
            last_execution_ms: registered_at_ms,
            active: true,
        }
    }

    /// Identifier.
    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// Number of recorded outcomes.
    pub const fn executed_tasks(&self) -> u64 {
        self.executed_tasks
    }

    /// Running success percentage in `[0, 100]`.
    pub const fn reliability(&self) -> f64 {
        self.reliability
    }

    /// Time of the last recorded outcome, or registration time.
    pub const fn last_execution_ms(&self) -> u128 {
        self.last_execution_ms
    }

    /// Whether the agent may receive new tasks.
    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) const fn deactivate(&mut self) {
        self.active = false;
    }

    /// Record one attempt outcome.
    ///
    /// With `n` outcomes after this one, the new mean is
    /// `(previous * (n - 1) + sample) / n` where the sample is 100 or 0.
    pub fn record_outcome(&mut self, success: bool, now_ms: u128) {
        self.executed_tasks += 1;
        let sample = if success { 100.0 } else { 0.0 };
        #[allow(clippy::cast_precision_loss)]
        let n = self.executed_tasks as f64;
        self.reliability = if self.executed_tasks == 1 {
            sample
        } else {
            self.reliability.mul_add(n - 1.0, sample) / n
        };
        self.last_execution_ms = now_ms;
    }

    /// Whether this agent may take a task of `kind` right now.
    pub fn is_eligible_for(&self, kind: TaskKind) -> bool {
        self.active
            && self.config.capabilities.contains(&kind)
            && self.reliability >= self.config.success_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(threshold: f64) -> Agent {
        Agent::new(
            AgentConfig::new("a", "TEST", 1)
                .with_capabilities([TaskKind::PaymentProcessing])
                .with_success_threshold(threshold),
            0,
        )
    }

    #[test]
    fn first_outcome_sets_reliability_directly() {
        let mut a = agent(0.0);
        a.record_outcome(false, 10);
        assert_eq!(a.reliability(), 0.0);
        assert_eq!(a.executed_tasks(), 1);
        assert_eq!(a.last_execution_ms(), 10);

        let mut b = agent(0.0);
        b.record_outcome(true, 10);
        assert_eq!(b.reliability(), 100.0);
    }

    #[test]
    fn running_mean_tracks_success_ratio() {
        let mut a = agent(0.0);
        for success in [true, false, true, true] {
            a.record_outcome(success, 1);
        }
        assert!((a.reliability() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn eligibility_requires_capability_threshold_and_liveness() {
        let mut a = agent(90.0);
        assert!(a.is_eligible_for(TaskKind::PaymentProcessing));
        assert!(!a.is_eligible_for(TaskKind::KycVerification));

        for _ in 0..3 {
            a.record_outcome(false, 1);
        }
        for _ in 0..7 {
            a.record_outcome(true, 1);
        }
        assert!((a.reliability() - 70.0).abs() < 1e-9);
        assert!(a.is_active());
        assert!(!a.is_eligible_for(TaskKind::PaymentProcessing));

        let mut b = agent(0.0);
        b.deactivate();
        assert!(!b.is_eligible_for(TaskKind::PaymentProcessing));
    }

    #[test]
    fn config_validation_rejects_out_of_range_threshold() {
        assert!(AgentConfig::new("a", "T", 0).validate().is_ok());
        assert!(AgentConfig::new("", "T", 0).validate().is_err());
        assert!(AgentConfig::new("a", "T", 0)
            .with_success_threshold(120.0)
            .validate()
            .is_err());
    }
}
