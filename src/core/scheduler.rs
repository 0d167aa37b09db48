//! Scheduler: registries, the periodic tick loop, and fire-and-forget dispatch.
//!
//! Each tick scans pending tasks whose execution time has arrived, picks the
//! best eligible agent for each, marks the task `Executing`, and hands it to a
//! [`RetrySupervisor`] spawned as an independent unit of work. A task with no
//! eligible agent simply stays pending until a later tick. After dispatching,
//! the health monitor runs over all agents.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use agent_orchestrator::config::OrchestratorConfig;
//! use agent_orchestrator::core::{AgentConfig, Scheduler, Task, TaskKind};
//! use agent_orchestrator::runtime::TokioSpawner;
//!
//! let scheduler = Arc::new(Scheduler::new(
//!     OrchestratorConfig::default(),
//!     my_executor,
//!     TokioSpawner::new(tokio::runtime::Handle::current()),
//! )?);
//! scheduler.register_agent(AgentConfig::new("payments", "PAYMENT", 1)
//!     .with_capabilities([TaskKind::PaymentProcessing]))?;
//! scheduler.submit_task(Task::new("order-7", TaskKind::PaymentProcessing, "0xabc", now))?;
//! scheduler.start();
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::agent::{Agent, AgentConfig, AgentId};
use super::audit::{AuditAction, AuditSink, AuditTrail};
use super::error::OrchestratorError;
use super::executor::TaskExecutor;
use super::health::{HealthAlert, HealthMonitor};
use super::registry::{AgentRegistry, TaskRegistry};
use super::retry::{RetrySupervisor, SupervisedOutcome};
use super::selection::select_agent;
use super::task::{Task, TaskId, TaskStatus};
use super::workflow::WorkflowRegistry;
use crate::config::OrchestratorConfig;
use crate::util::clock::{Clock, SystemClock};

/// Abstraction for spawning task execution on a runtime.
pub trait Spawn {
    /// Spawn a detached future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Summary of one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Tasks that were due at the start of the tick.
    pub due: usize,
    /// Tasks handed to a retry supervisor.
    pub dispatched: usize,
    /// Due tasks left pending (no eligible agent or dispatch limit reached).
    pub deferred: usize,
    /// Due tasks that were no longer pending when the tick went to claim
    /// them. `due == dispatched + deferred + skipped`.
    pub skipped: usize,
    /// Health findings raised this tick.
    pub alerts: Vec<HealthAlert>,
}

/// Handle that stops a running tick loop from elsewhere.
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
}

impl StopHandle {
    /// Request the loop to exit before its next tick.
    pub fn stop(&self) {
        halt(&self.running, &self.generation);
    }
}

/// Clears the running flag and retires the current loop generation, so a
/// loop still sleeping exits even if a new one is started before it wakes.
fn halt(running: &AtomicBool, generation: &AtomicU64) {
    generation.fetch_add(1, Ordering::AcqRel);
    running.store(false, Ordering::Release);
}

/// Concurrency accounting for supervised tasks.
#[derive(Debug, Default)]
struct Load {
    total: AtomicUsize,
    per_agent: Mutex<HashMap<AgentId, u32>>,
}

impl Load {
    fn agent(&self, id: &str) -> u32 {
        self.per_agent.lock().get(id).copied().unwrap_or(0)
    }

    fn acquire(self: &Arc<Self>, agent_id: &str) -> LoadGuard {
        self.total.fetch_add(1, Ordering::AcqRel);
        *self.per_agent.lock().entry(agent_id.to_string()).or_insert(0) += 1;
        LoadGuard {
            load: Arc::clone(self),
            agent_id: agent_id.to_string(),
        }
    }
}

/// Releases a dispatch slot when the supervising future ends, even by panic.
struct LoadGuard {
    load: Arc<Load>,
    agent_id: AgentId,
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        self.load.total.fetch_sub(1, Ordering::AcqRel);
        let mut per_agent = self.load.per_agent.lock();
        if let Some(n) = per_agent.get_mut(&self.agent_id) {
            *n = n.saturating_sub(1);
            if *n == 0 {
                per_agent.remove(&self.agent_id);
            }
        }
    }
}

/// Owns the agent and task registries and drives dispatch.
pub struct Scheduler<E, S> {
    config: OrchestratorConfig,
    agents: Arc<AgentRegistry>,
    tasks: Arc<TaskRegistry>,
    workflows: WorkflowRegistry,
    executor: Arc<E>,
    spawner: S,
    clock: Arc<dyn Clock>,
    health: HealthMonitor,
    audit: AuditTrail,
    running: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    load: Arc<Load>,
}

impl<E, S> Scheduler<E, S>
where
    E: TaskExecutor,
    S: Spawn,
{
    /// Create a scheduler reading the system clock.
    pub fn new(
        config: OrchestratorConfig,
        executor: E,
        spawner: S,
    ) -> Result<Self, OrchestratorError> {
        config.validate().map_err(OrchestratorError::InvalidConfig)?;
        Ok(Self {
            health: HealthMonitor::new(config.health_thresholds()),
            config,
            agents: Arc::new(AgentRegistry::new()),
            tasks: Arc::new(TaskRegistry::new()),
            workflows: WorkflowRegistry::new(),
            executor: Arc::new(executor),
            spawner,
            clock: Arc::new(SystemClock),
            audit: AuditTrail::disabled(),
            running: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            load: Arc::new(Load::default()),
        })
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.audit = self.audit.with_clock(Arc::clone(&clock));
        self.clock = clock;
        self
    }

    /// Attach an audit sink. Events are stamped with the scheduler's clock.
    #[must_use]
    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = AuditTrail::new(sink).with_clock(Arc::clone(&self.clock));
        self
    }

    /// Active configuration.
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Shared agent registry.
    pub const fn agent_registry(&self) -> &Arc<AgentRegistry> {
        &self.agents
    }

    /// Shared task registry.
    pub const fn task_registry(&self) -> &Arc<TaskRegistry> {
        &self.tasks
    }

    /// Register an agent.
    pub fn register_agent(&self, config: AgentConfig) -> Result<AgentId, OrchestratorError> {
        let agent_type = config.agent_type.clone();
        let id = self.agents.register(config, self.clock.now_ms())?;
        tracing::info!(agent = %id, agent_type = %agent_type, "registered agent");
        self.audit.emit(AuditAction::Register, None, Some(&id), Some(agent_type));
        Ok(id)
    }

    /// Stop assigning new tasks to an agent.
    pub fn deactivate_agent(&self, id: &str) -> Result<(), OrchestratorError> {
        self.agents.deactivate(id)?;
        tracing::info!(agent = id, "deactivated agent");
        self.audit.emit(AuditAction::Deactivate, None, Some(id), None);
        Ok(())
    }

    /// Submit a pending task. A recurring task needs a non-zero interval.
    pub fn submit_task(&self, task: Task) -> Result<TaskId, OrchestratorError> {
        if task.status() != TaskStatus::Pending {
            return Err(OrchestratorError::InvalidTask(format!(
                "task {} must be pending on submission",
                task.id
            )));
        }
        if task.recurring_interval == Some(Duration::ZERO) {
            return Err(OrchestratorError::InvalidTask(format!(
                "task {} has a zero recurrence interval",
                task.id
            )));
        }
        let kind = task.kind;
        let id = self.tasks.submit(task)?;
        tracing::info!(task = %id, kind = %kind, "scheduled task");
        let detail = kind.to_string();
        self.audit.emit(AuditAction::Submit, Some(&id), None, Some(detail));
        Ok(id)
    }

    /// Snapshot of an agent.
    pub fn agent(&self, id: &str) -> Option<Agent> {
        self.agents.get(id)
    }

    /// Snapshot of a task.
    pub fn task(&self, id: &str) -> Option<Task> {
        self.tasks.get(id)
    }

    /// Store a workflow template.
    pub fn create_workflow(
        &self,
        id: impl Into<String>,
        sequence: Vec<TaskId>,
    ) -> Result<(), OrchestratorError> {
        self.workflows.create(id, sequence)
    }

    /// Read a workflow template.
    pub fn workflow(&self, id: &str) -> Option<Vec<TaskId>> {
        self.workflows.get(id)
    }

    /// Tasks currently under supervision.
    pub fn in_flight(&self) -> usize {
        self.load.total.load(Ordering::Acquire)
    }

    /// Tasks currently under supervision for one agent.
    pub fn in_flight_for(&self, agent_id: &str) -> u32 {
        self.load.agent(agent_id)
    }

    /// Whether the tick loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Handle that can stop the loop from another task.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
            generation: Arc::clone(&self.generation),
        }
    }

    /// Request the loop to exit before its next tick. In-flight retry
    /// sequences keep running.
    pub fn stop(&self) {
        halt(&self.running, &self.generation);
        tracing::info!("orchestration stop requested");
    }

    /// Run one scheduling cycle.
    pub fn tick(&self) -> TickReport {
        let now = self.clock.now_ms();
        let due = self.tasks.list_due(now);
        let mut report = TickReport {
            due: due.len(),
            ..TickReport::default()
        };

        for task in due {
            if self
                .config
                .max_in_flight
                .is_some_and(|max| self.in_flight() >= max)
            {
                tracing::debug!(task = %task.id, "dispatch limit reached, deferring");
                report.deferred += 1;
                continue;
            }

            let per_agent_cap = self.config.max_in_flight_per_agent;
            let chosen = self.agents.with_agents(|agents| {
                select_agent(agents, task.kind, |a| {
                    per_agent_cap.is_none_or(|cap| self.load.agent(a.id()) < cap)
                })
                .map(|a| a.id().to_string())
            });
            let Some(agent_id) = chosen else {
                tracing::debug!(
                    task = %task.id,
                    kind = %task.kind,
                    "no eligible agent, task stays pending"
                );
                report.deferred += 1;
                continue;
            };

            let claimed = self
                .tasks
                .update(&task.id, |t| t.mark_executing(agent_id.clone()))
                .unwrap_or(false);
            if !claimed {
                report.skipped += 1;
                continue;
            }
            self.dispatch(agent_id, task.id);
            report.dispatched += 1;
        }

        report.alerts = self
            .agents
            .with_agents(|agents| self.health.check(agents, now));
        for alert in &report.alerts {
            self.audit.emit(
                AuditAction::HealthAlert,
                None,
                Some(alert.agent_id()),
                serde_json::to_string(alert).ok(),
            );
        }
        report
    }

    fn dispatch(&self, agent_id: AgentId, task_id: TaskId) {
        tracing::info!(task = %task_id, agent = %agent_id, "dispatching task");
        self.audit.emit(AuditAction::Dispatch, Some(&task_id), Some(&agent_id), None);

        let guard = self.load.acquire(&agent_id);
        let supervisor = RetrySupervisor::new(
            Arc::clone(&self.agents),
            Arc::clone(&self.tasks),
            Arc::clone(&self.executor),
            self.config.backoff_policy(),
            Arc::clone(&self.clock),
            self.audit.clone(),
        );
        let tasks = Arc::clone(&self.tasks);
        let audit = self.audit.clone();
        let resubmit = self.config.resubmit_recurring;

        self.spawner.spawn(async move {
            let _guard = guard;
            let outcome = supervisor.run(&agent_id, &task_id).await;
            if resubmit {
                resubmit_recurring(&tasks, &audit, &task_id, outcome);
            }
        });
    }

    /// Run the tick loop on the current task until stopped. Returns `false`
    /// at once if a loop is already running.
    pub async fn run(&self) -> bool {
        let Some(generation) = self.claim_loop() else {
            return false;
        };
        self.run_loop(generation).await;
        true
    }

    /// Sets the running flag and returns the generation the new loop owns,
    /// or `None` if a loop is already running.
    fn claim_loop(&self) -> Option<u64> {
        if self.running.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(self.generation.load(Ordering::Acquire))
    }

    fn owns_loop(&self, generation: u64) -> bool {
        self.is_running() && self.generation.load(Ordering::Acquire) == generation
    }

    async fn run_loop(&self, generation: u64) {
        tracing::info!(generation, "orchestration loop started");
        while self.owns_loop(generation) {
            let pause = match std::panic::catch_unwind(AssertUnwindSafe(|| self.tick())) {
                Ok(report) => {
                    tracing::debug!(
                        due = report.due,
                        dispatched = report.dispatched,
                        deferred = report.deferred,
                        skipped = report.skipped,
                        alerts = report.alerts.len(),
                        "tick finished"
                    );
                    self.config.tick_interval()
                }
                Err(panic) => {
                    let error = panic_message(panic.as_ref());
                    tracing::error!(error = %error, "orchestration loop error");
                    self.config.error_pause()
                }
            };
            tokio::time::sleep(pause).await;
        }
        tracing::info!(generation, "orchestration loop stopped");
    }
}

impl<E, S> Scheduler<E, S>
where
    E: TaskExecutor,
    S: Spawn + Send + Sync + 'static,
{
    /// Spawn the tick loop on the scheduler's spawner. Returns `false` if the
    /// loop was already running.
    pub fn start(self: &Arc<Self>) -> bool {
        let Some(generation) = self.claim_loop() else {
            return false;
        };
        let this = Arc::clone(self);
        self.spawner.spawn(async move { this.run_loop(generation).await });
        true
    }
}

fn resubmit_recurring(
    tasks: &TaskRegistry,
    audit: &AuditTrail,
    task_id: &str,
    outcome: SupervisedOutcome,
) {
    let Some(finished) = tasks.get(task_id) else {
        return;
    };
    let Some(interval) = finished.recurring_interval else {
        return;
    };
    let root = task_id.split('@').next().unwrap_or(task_id);
    let next_id = format!("{root}@{}", finished.execution_time_ms + interval.as_millis());
    let Some(next) = finished.next_occurrence(next_id) else {
        return;
    };
    match tasks.submit(next) {
        Ok(id) => {
            tracing::info!(
                task = %id,
                previous = task_id,
                previous_status = ?outcome.status,
                "resubmitted recurring task"
            );
            let detail = format!("recurrence of {task_id}");
            audit.emit(AuditAction::Submit, Some(&id), None, Some(detail));
        }
        Err(e) => {
            tracing::warn!(task = task_id, error = %e, "could not resubmit recurring task");
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
