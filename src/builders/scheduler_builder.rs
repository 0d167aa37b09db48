//! Build a scheduler from a deployment description.

use std::sync::Arc;

use crate::config::DeploymentConfig;
use crate::core::{AuditSink, OrchestratorError, Scheduler, Spawn, TaskExecutor};
use crate::util::clock::Clock;

/// Assembles a [`Scheduler`] and registers the deployment's agents.
pub struct SchedulerBuilder {
    deployment: DeploymentConfig,
    clock: Option<Arc<dyn Clock>>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl SchedulerBuilder {
    /// Start from a deployment description.
    pub const fn new(deployment: DeploymentConfig) -> Self {
        Self {
            deployment,
            clock: None,
            audit: None,
        }
    }

    /// Use a specific time source instead of the system clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Validate the deployment, create the scheduler, and register every agent.
    pub fn build<E, S>(self, executor: E, spawner: S) -> Result<Scheduler<E, S>, OrchestratorError>
    where
        E: TaskExecutor,
        S: Spawn,
    {
        self.deployment
            .validate()
            .map_err(OrchestratorError::InvalidConfig)?;

        let mut scheduler = Scheduler::new(self.deployment.orchestrator, executor, spawner)?;
        if let Some(clock) = self.clock {
            scheduler = scheduler.with_clock(clock);
        }
        if let Some(sink) = self.audit {
            scheduler = scheduler.with_audit(sink);
        }
        for agent in self.deployment.agents {
            scheduler.register_agent(agent)?;
        }
        Ok(scheduler)
    }
}

/// Build a scheduler on the system clock with no audit sink.
pub fn build_scheduler<E, S>(
    deployment: DeploymentConfig,
    executor: E,
    spawner: S,
) -> Result<Scheduler<E, S>, OrchestratorError>
where
    E: TaskExecutor,
    S: Spawn,
{
    SchedulerBuilder::new(deployment).build(executor, spawner)
}
