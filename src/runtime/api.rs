//! API-facing request/response models.
//!
//! These are the serde shapes a CLI, script, or service front-end uses to
//! populate the registries and inspect outcomes. Tags arrive as strings and
//! are validated here, so an unknown task type is rejected at submission.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{
    AgentConfig, AgentId, OrchestratorError, Payload, Scheduler, Spawn, Task, TaskExecutor,
    TaskId, TaskKind, TaskStatus,
};

/// Agent registration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRegistration {
    /// Agent identifier.
    pub agent_id: AgentId,
    /// Free-form type tag.
    pub agent_type: String,
    /// Selection priority.
    pub priority: i32,
    /// Task type tags the agent can execute.
    pub capabilities: Vec<String>,
    /// Retries after the first attempt.
    #[serde(default)]
    pub retry_attempts: u32,
    /// Minimum reliability percentage.
    #[serde(default)]
    pub success_threshold: f64,
    /// External resource budget.
    #[serde(default)]
    pub max_gas: u64,
}

impl TryFrom<AgentRegistration> for AgentConfig {
    type Error = OrchestratorError;

    fn try_from(req: AgentRegistration) -> Result<Self, Self::Error> {
        let capabilities = req
            .capabilities
            .iter()
            .map(|tag| tag.parse::<TaskKind>())
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self::new(req.agent_id, req.agent_type, req.priority)
            .with_capabilities(capabilities)
            .with_max_retries(req.retry_attempts)
            .with_success_threshold(req.success_threshold)
            .with_max_gas(req.max_gas))
    }
}

/// Task submission request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSubmission {
    /// Task identifier.
    pub task_id: TaskId,
    /// Task type tag.
    pub task_type: String,
    /// Opaque target reference.
    pub target: String,
    /// Earliest execution time (ms since epoch); defaults to now.
    #[serde(default)]
    pub execution_time_ms: Option<u128>,
    /// Named payload fields.
    #[serde(default)]
    pub data: Payload,
    /// Caller priority.
    #[serde(default)]
    pub priority: i32,
    /// Recurrence interval in seconds.
    #[serde(default)]
    pub recurring_interval_secs: Option<u64>,
}

impl TaskSubmission {
    /// Convert into a pending task, resolving a missing execution time to `now_ms`.
    pub fn into_task(self, now_ms: u128) -> Result<Task, OrchestratorError> {
        let kind = self.task_type.parse::<TaskKind>()?;
        let mut task = Task::new(
            self.task_id,
            kind,
            self.target,
            self.execution_time_ms.unwrap_or(now_ms),
        )
        .with_payload(self.data)
        .with_priority(self.priority);
        if let Some(secs) = self.recurring_interval_secs {
            task = task.recurring_every(Duration::from_secs(secs));
        }
        Ok(task)
    }
}

/// Task status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    /// Task identifier.
    pub task_id: TaskId,
    /// Current status.
    pub status: TaskStatus,
    /// Agent the task was assigned to.
    pub assigned_agent: Option<AgentId>,
    /// Retries performed.
    pub retry_count: u32,
}

/// Agent listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Agent identifier.
    pub agent_id: AgentId,
    /// Free-form type tag.
    pub agent_type: String,
    /// Selection priority.
    pub priority: i32,
    /// Whether the agent accepts new tasks.
    pub active: bool,
    /// Running success percentage.
    pub reliability: f64,
    /// Recorded outcomes.
    pub executed_tasks: u64,
    /// Last recorded outcome (ms since epoch).
    pub last_execution_ms: u128,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag: the loop is running or nothing is waiting on it.
    pub ok: bool,
    /// Whether the tick loop is running.
    pub running: bool,
    /// Registered agents.
    pub agents: usize,
    /// Active agents.
    pub active_agents: usize,
    /// Pending tasks.
    pub pending: usize,
    /// Executing tasks.
    pub executing: usize,
    /// Completed tasks.
    pub completed: usize,
    /// Failed tasks.
    pub failed: usize,
}

/// Register an agent from a request.
pub fn register_agent<E, S>(
    scheduler: &Scheduler<E, S>,
    req: AgentRegistration,
) -> Result<AgentId, OrchestratorError>
where
    E: TaskExecutor,
    S: Spawn,
{
    scheduler.register_agent(AgentConfig::try_from(req)?)
}

/// Submit a task from a request.
pub fn submit_task<E, S>(
    scheduler: &Scheduler<E, S>,
    req: TaskSubmission,
    now_ms: u128,
) -> Result<TaskId, OrchestratorError>
where
    E: TaskExecutor,
    S: Spawn,
{
    scheduler.submit_task(req.into_task(now_ms)?)
}

/// Current status of a task.
pub fn task_status<E, S>(
    scheduler: &Scheduler<E, S>,
    task_id: &str,
) -> Result<TaskStatusResponse, OrchestratorError>
where
    E: TaskExecutor,
    S: Spawn,
{
    let task = scheduler
        .task(task_id)
        .ok_or_else(|| OrchestratorError::UnknownTask(task_id.to_string()))?;
    Ok(TaskStatusResponse {
        task_id: task.id.clone(),
        status: task.status(),
        assigned_agent: task.assigned_agent().map(str::to_string),
        retry_count: task.retry_count(),
    })
}

/// Snapshot of every registered agent.
pub fn list_agents<E, S>(scheduler: &Scheduler<E, S>) -> Vec<AgentSnapshot>
where
    E: TaskExecutor,
    S: Spawn,
{
    scheduler
        .agent_registry()
        .list_all()
        .into_iter()
        .map(|a| AgentSnapshot {
            agent_id: a.id().to_string(),
            agent_type: a.config.agent_type.clone(),
            priority: a.config.priority,
            active: a.is_active(),
            reliability: a.reliability(),
            executed_tasks: a.executed_tasks(),
            last_execution_ms: a.last_execution_ms(),
        })
        .collect()
}

/// Return a health payload.
pub fn health<E, S>(scheduler: &Scheduler<E, S>) -> Health
where
    E: TaskExecutor,
    S: Spawn,
{
    let agents = scheduler.agent_registry();
    let tasks = scheduler.task_registry();
    let pending = tasks.count_by_status(TaskStatus::Pending);
    let running = scheduler.is_running();
    Health {
        ok: running || pending == 0,
        running,
        agents: agents.len(),
        active_agents: agents.list_active().len(),
        pending,
        executing: tasks.count_by_status(TaskStatus::Executing),
        completed: tasks.count_by_status(TaskStatus::Completed),
        failed: tasks.count_by_status(TaskStatus::Failed),
    }
}
