//! Retry supervisor: runs a dispatched task's attempts with exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use super::agent::Agent;
use super::audit::{AuditAction, AuditTrail};
use super::error::ExecutionError;
use super::executor::TaskExecutor;
use super::registry::{AgentRegistry, TaskRegistry};
use super::task::{Task, TaskStatus};
use crate::util::clock::Clock;

/// Exponential backoff between attempts: `unit * 2^attempt`, optionally capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub unit: Duration,
    /// Upper bound on any single delay; `None` leaves growth unbounded.
    pub max_delay: Option<Duration>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            unit: Duration::from_secs(1),
            max_delay: None,
        }
    }
}

impl BackoffPolicy {
    /// Delay to wait after failed attempt `attempt` (0-indexed).
    pub fn delay(&self, attempt: u32) -> Duration {
        let raw = 1u32
            .checked_shl(attempt)
            .and_then(|factor| self.unit.checked_mul(factor))
            .unwrap_or(Duration::MAX);
        self.max_delay.map_or(raw, |cap| raw.min(cap))
    }

    /// Total backoff slept before `attempts` attempts have been made.
    pub fn total_before(&self, attempts: u32) -> Duration {
        (0..attempts.saturating_sub(1))
            .map(|a| self.delay(a))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

/// Result of a supervised attempt sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisedOutcome {
    /// Terminal status written to the task.
    pub status: TaskStatus,
    /// Attempts actually made.
    pub attempts: u32,
}

/// Runs one task's attempts against one agent and records every outcome.
///
/// Nothing escapes `run`: reported failures, executor errors, and panics
/// inside the executor all count as a failed attempt.
pub struct RetrySupervisor<E> {
    agents: Arc<AgentRegistry>,
    tasks: Arc<TaskRegistry>,
    executor: Arc<E>,
    backoff: BackoffPolicy,
    clock: Arc<dyn Clock>,
    audit: AuditTrail,
}

impl<E> Clone for RetrySupervisor<E> {
    fn clone(&self) -> Self {
        Self {
            agents: Arc::clone(&self.agents),
            tasks: Arc::clone(&self.tasks),
            executor: Arc::clone(&self.executor),
            backoff: self.backoff,
            clock: Arc::clone(&self.clock),
            audit: self.audit.clone(),
        }
    }
}

impl<E: TaskExecutor> RetrySupervisor<E> {
    /// Create a supervisor over shared registries.
    pub fn new(
        agents: Arc<AgentRegistry>,
        tasks: Arc<TaskRegistry>,
        executor: Arc<E>,
        backoff: BackoffPolicy,
        clock: Arc<dyn Clock>,
        audit: AuditTrail,
    ) -> Self {
        Self {
            agents,
            tasks,
            executor,
            backoff,
            clock,
            audit,
        }
    }

    /// Backoff policy in use.
    pub const fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }

    /// Run up to `max_retries + 1` attempts of `task_id` on `agent_id`.
    ///
    /// The task must already be `Executing`. It ends `Completed` on the first
    /// successful attempt, or `Failed` once every attempt has failed.
    pub async fn run(&self, agent_id: &str, task_id: &str) -> SupervisedOutcome {
        let Some(max_retries) = self.agents.get(agent_id).map(|a| a.config.max_retries) else {
            tracing::error!(agent = agent_id, task = task_id, "assigned agent is not registered");
            return self.finish_failed(agent_id, task_id, 0);
        };

        let mut attempts = 0;
        for attempt in 0..=max_retries {
            let (Some(task), Some(agent)) = (self.tasks.get(task_id), self.agents.get(agent_id))
            else {
                tracing::error!(agent = agent_id, task = task_id, "task or agent vanished mid-run");
                return self.finish_failed(agent_id, task_id, attempts);
            };

            attempts += 1;
            let success = match self.attempt(task, agent).await {
                Ok(success) => success,
                Err(e) => {
                    tracing::error!(
                        task = task_id,
                        agent = agent_id,
                        attempt,
                        error = %e,
                        "task execution error"
                    );
                    false
                }
            };
            let reliability = self
                .agents
                .record_outcome(agent_id, success, self.clock.now_ms())
                .unwrap_or_default();

            if success {
                self.tasks.update(task_id, Task::mark_completed);
                tracing::info!(task = task_id, agent = agent_id, attempts, "task completed");
                self.audit.emit(
                    AuditAction::Complete,
                    Some(task_id),
                    Some(agent_id),
                    Some(format!("attempts={attempts} reliability={reliability:.2}")),
                );
                return SupervisedOutcome {
                    status: TaskStatus::Completed,
                    attempts,
                };
            }

            self.audit.emit(
                AuditAction::AttemptFailed,
                Some(task_id),
                Some(agent_id),
                Some(format!("attempt={attempt}")),
            );
            if attempt < max_retries {
                let delay = self.backoff.delay(attempt);
                tracing::warn!(
                    task = task_id,
                    retry = attempt + 1,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "task failed, retrying"
                );
                self.tasks.update(task_id, Task::record_retry);
                tokio::time::sleep(delay).await;
            }
        }

        tracing::error!(
            task = task_id,
            agent = agent_id,
            max_retries,
            "task failed after all retries"
        );
        self.finish_failed(agent_id, task_id, attempts)
    }

    /// One attempt, isolated on its own tokio task so a panicking executor is
    /// reported as a fault instead of tearing down the supervisor.
    async fn attempt(&self, task: Task, agent: Agent) -> Result<bool, ExecutionError> {
        let executor = Arc::clone(&self.executor);
        let handle = tokio::spawn(async move { executor.execute(&task, &agent).await });
        handle
            .await
            .map_err(|join| ExecutionError::Fault(format!("executor panicked: {join}")))?
    }

    fn finish_failed(&self, agent_id: &str, task_id: &str, attempts: u32) -> SupervisedOutcome {
        self.tasks.update(task_id, Task::mark_failed);
        self.audit.emit(
            AuditAction::Fail,
            Some(task_id),
            Some(agent_id),
            Some(format!("attempts={attempts}")),
        );
        SupervisedOutcome {
            status: TaskStatus::Failed,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_double_from_the_unit() {
        let policy = BackoffPolicy {
            unit: Duration::from_millis(10),
            max_delay: None,
        };
        assert_eq!(policy.delay(0), Duration::from_millis(10));
        assert_eq!(policy.delay(1), Duration::from_millis(20));
        assert_eq!(policy.delay(3), Duration::from_millis(80));
        assert_eq!(policy.total_before(1), Duration::ZERO);
        assert_eq!(policy.total_before(4), Duration::from_millis(70));
    }

    #[test]
    fn cap_bounds_growth() {
        let policy = BackoffPolicy {
            unit: Duration::from_secs(1),
            max_delay: Some(Duration::from_secs(5)),
        };
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(policy.delay(3), Duration::from_secs(5));
        assert_eq!(policy.delay(40), Duration::from_secs(5));
    }

    #[test]
    fn huge_attempts_saturate_instead_of_overflowing() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay(64), Duration::MAX);
    }
}
