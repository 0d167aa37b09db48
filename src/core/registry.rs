//! Agent and task registries.
//!
//! Both registries are shared between the tick loop and concurrently running
//! retry supervisors, so every access goes through a `parking_lot::RwLock`.
//! Entries live in insertion order, which makes iteration (and therefore
//! tie-breaking during selection) deterministic for a fixed registration
//! order. Readers receive clones; no guard escapes a method.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::agent::{Agent, AgentConfig, AgentId};
use super::error::OrchestratorError;
use super::task::{Task, TaskId, TaskStatus};

struct Table<T> {
    entries: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Table<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    fn insert(&mut self, id: String, entry: T) {
        self.index.insert(id, self.entries.len());
        self.entries.push(entry);
    }

    fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.index.get(id).map(|&i| &mut self.entries[i])
    }
}

/// Registry of agents. The only place agent statistics are mutated.
pub struct AgentRegistry {
    inner: RwLock<Table<Agent>>,
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Table::new()),
        }
    }

    /// Register an agent. Fails on an invalid config or a duplicate id.
    pub fn register(
        &self,
        config: AgentConfig,
        now_ms: u128,
    ) -> Result<AgentId, OrchestratorError> {
        config.validate().map_err(OrchestratorError::InvalidConfig)?;
        let mut table = self.inner.write();
        if table.contains(&config.id) {
            return Err(OrchestratorError::DuplicateAgent(config.id));
        }
        let id = config.id.clone();
        table.insert(id.clone(), Agent::new(config, now_ms));
        Ok(id)
    }

    /// Snapshot of a single agent.
    pub fn get(&self, id: &str) -> Option<Agent> {
        self.inner.read().get(id).cloned()
    }

    /// Stop assigning new tasks to an agent. In-flight work is unaffected.
    pub fn deactivate(&self, id: &str) -> Result<(), OrchestratorError> {
        let mut table = self.inner.write();
        let agent = table
            .get_mut(id)
            .ok_or_else(|| OrchestratorError::UnknownAgent(id.to_string()))?;
        agent.deactivate();
        Ok(())
    }

    /// Active agents in registration order.
    pub fn list_active(&self) -> Vec<Agent> {
        self.inner
            .read()
            .entries
            .iter()
            .filter(|a| a.is_active())
            .cloned()
            .collect()
    }

    /// Every agent in registration order, active or not.
    pub fn list_all(&self) -> Vec<Agent> {
        self.inner.read().entries.clone()
    }

    /// Run `f` over the agents without cloning them.
    pub fn with_agents<R>(&self, f: impl FnOnce(&[Agent]) -> R) -> R {
        f(&self.inner.read().entries)
    }

    /// Fold one attempt outcome into an agent's statistics and return the new
    /// reliability, or `None` if the agent is unknown.
    pub fn record_outcome(&self, id: &str, success: bool, now_ms: u128) -> Option<f64> {
        let mut table = self.inner.write();
        let agent = table.get_mut(id)?;
        agent.record_outcome(success, now_ms);
        Some(agent.reliability())
    }

    /// Number of registered agents.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Whether no agent is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registry of tasks. Tasks are retained after reaching a terminal status.
pub struct TaskRegistry {
    inner: RwLock<Table<Task>>,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Table::new()),
        }
    }

    /// Submit a task. Fails on a duplicate id.
    pub fn submit(&self, task: Task) -> Result<TaskId, OrchestratorError> {
        let mut table = self.inner.write();
        if table.contains(&task.id) {
            return Err(OrchestratorError::DuplicateTask(task.id));
        }
        let id = task.id.clone();
        table.insert(id.clone(), task);
        Ok(id)
    }

    /// Snapshot of a single task.
    pub fn get(&self, id: &str) -> Option<Task> {
        self.inner.read().get(id).cloned()
    }

    /// Pending tasks whose execution time is at or before `now_ms`.
    /// Order follows the registry and carries no fairness guarantee.
    pub fn list_due(&self, now_ms: u128) -> Vec<Task> {
        self.inner
            .read()
            .entries
            .iter()
            .filter(|t| t.is_due(now_ms))
            .cloned()
            .collect()
    }

    /// Every task in submission order.
    pub fn list_all(&self) -> Vec<Task> {
        self.inner.read().entries.clone()
    }

    /// Apply `f` to a task under the write lock.
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut Task) -> R) -> Option<R> {
        let mut table = self.inner.write();
        table.get_mut(id).map(f)
    }

    /// Number of tasks currently in `status`.
    pub fn count_by_status(&self, status: TaskStatus) -> usize {
        self.inner
            .read()
            .entries
            .iter()
            .filter(|t| t.status() == status)
            .count()
    }

    /// Number of submitted tasks.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Whether no task has been submitted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
