//! Unit tests for individual components

mod api_test;
mod audit_test;
mod builders_test;
mod config_test;
mod error_test;
mod runtime_test;
mod util_test;

use agent_orchestrator::core::{Agent, ExecutionError, Spawn, Task, TaskExecutor};
use async_trait::async_trait;
use std::future::Future;

/// Executor that succeeds immediately.
pub struct Succeed;

#[async_trait]
impl TaskExecutor for Succeed {
    async fn execute(&self, _task: &Task, _agent: &Agent) -> Result<bool, ExecutionError> {
        Ok(true)
    }
}

/// Spawner that drops every future; for tests that never dispatch.
#[derive(Clone, Copy)]
pub struct NoSpawn;

impl Spawn for NoSpawn {
    fn spawn<F>(&self, _fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
    }
}
