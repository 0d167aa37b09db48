//! Task model and lifecycle state machine.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::OrchestratorError;
use super::AgentId;

/// Task identifier.
pub type TaskId = String;

/// Named payload fields carried by a task.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Known kinds of work. Also used as agent capability tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    /// Transfer tokens to a recipient.
    TokenDistribution,
    /// Compute and pay a referral commission.
    CommissionCalculation,
    /// Add or remove pool liquidity.
    LiquidityManagement,
    /// Release or refund an escrowed order payment.
    PaymentProcessing,
    /// Record a KYC verification outcome.
    KycVerification,
    /// Record a proof-of-contact check-in.
    PocVerification,
}

impl TaskKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::TokenDistribution,
        Self::CommissionCalculation,
        Self::LiquidityManagement,
        Self::PaymentProcessing,
        Self::KycVerification,
        Self::PocVerification,
    ];

    /// Wire tag for this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TokenDistribution => "TOKEN_DISTRIBUTION",
            Self::CommissionCalculation => "COMMISSION_CALCULATION",
            Self::LiquidityManagement => "LIQUIDITY_MANAGEMENT",
            Self::PaymentProcessing => "PAYMENT_PROCESSING",
            Self::KycVerification => "KYC_VERIFICATION",
            Self::PocVerification => "POC_VERIFICATION",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| OrchestratorError::UnsupportedTaskKind(s.to_string()))
    }
}

/// Lifecycle status: `Pending -> Executing -> {Completed, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for its execution time and an eligible agent.
    Pending,
    /// Handed to a retry supervisor.
    Executing,
    /// An attempt succeeded.
    Completed,
    /// Every attempt failed.
    Failed,
}

impl TaskStatus {
    /// Whether the status is final.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A unit of scheduled work.
///
/// Lifecycle fields (`status`, `assigned_agent`, `retry_count`) are only
/// changed through the transition methods, which keep `assigned_agent` set
/// exactly when the task has left `Pending`.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    /// Unique identifier.
    pub id: TaskId,
    /// Kind of work, matched against agent capabilities.
    pub kind: TaskKind,
    /// Opaque target reference (contract or endpoint address).
    pub target: String,
    /// Earliest execution time, milliseconds since the Unix epoch.
    pub execution_time_ms: u128,
    /// Named payload fields.
    pub payload: Payload,
    /// Caller-assigned priority. Informational; due tasks are not ordered by it.
    pub priority: i32,
    /// Re-creation interval for recurring tasks.
    pub recurring_interval: Option<Duration>,
    assigned_agent: Option<AgentId>,
    status: TaskStatus,
    retry_count: u32,
}

impl Task {
    /// Create a pending task with an empty payload.
    pub fn new(
        id: impl Into<TaskId>,
        kind: TaskKind,
        target: impl Into<String>,
        execution_time_ms: u128,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            target: target.into(),
            execution_time_ms,
            payload: Payload::new(),
            priority: 0,
            recurring_interval: None,
            assigned_agent: None,
            status: TaskStatus::Pending,
            retry_count: 0,
        }
    }

    /// Replace the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Set a single payload field.
    #[must_use]
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.payload.insert(name.into(), value.into());
        self
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Mark the task as recurring with the given interval.
    #[must_use]
    pub fn recurring_every(mut self, interval: Duration) -> Self {
        self.recurring_interval = Some(interval);
        self
    }

    /// Current status.
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Agent the task was handed to, if it has left `Pending`.
    pub fn assigned_agent(&self) -> Option<&str> {
        self.assigned_agent.as_deref()
    }

    /// Number of retries performed after the first attempt.
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Whether the task is recurring.
    pub const fn is_recurring(&self) -> bool {
        self.recurring_interval.is_some()
    }

    /// Whether the task is pending and its execution time has arrived.
    pub fn is_due(&self, now_ms: u128) -> bool {
        self.status == TaskStatus::Pending && self.execution_time_ms <= now_ms
    }

    /// `Pending -> Executing`, recording the assigned agent.
    /// Returns `false` and leaves the task untouched from any other state.
    pub fn mark_executing(&mut self, agent: impl Into<AgentId>) -> bool {
        if self.status != TaskStatus::Pending {
            return false;
        }
        self.assigned_agent = Some(agent.into());
        self.status = TaskStatus::Executing;
        true
    }

    /// `Executing -> Completed`.
    pub fn mark_completed(&mut self) -> bool {
        self.finish(TaskStatus::Completed)
    }

    /// `Executing -> Failed`.
    pub fn mark_failed(&mut self) -> bool {
        self.finish(TaskStatus::Failed)
    }

    fn finish(&mut self, terminal: TaskStatus) -> bool {
        if self.status != TaskStatus::Executing {
            return false;
        }
        self.status = terminal;
        true
    }

    pub(crate) const fn record_retry(&mut self) {
        self.retry_count = self.retry_count.saturating_add(1);
    }

    /// Build the next pending occurrence of a recurring task under a new id.
    /// Returns `None` for one-shot tasks.
    pub fn next_occurrence(&self, new_id: impl Into<TaskId>) -> Option<Self> {
        let interval = self.recurring_interval?;
        let mut next = Self::new(
            new_id,
            self.kind,
            self.target.clone(),
            self.execution_time_ms + interval.as_millis(),
        );
        next.payload = self.payload.clone();
        next.priority = self.priority;
        next.recurring_interval = self.recurring_interval;
        Some(next)
    }
}
