//! Task execution seam.
//!
//! The scheduler never performs side effects itself. It hands a task and the
//! agent chosen for it to a [`TaskExecutor`] and only looks at the outcome.

use std::sync::Arc;

use async_trait::async_trait;

use super::agent::Agent;
use super::error::ExecutionError;
use super::task::Task;

/// Performs the side-effecting work of a task on behalf of an agent.
///
/// `Ok(true)` is a success, `Ok(false)` a reported failure, and `Err` a
/// fault. The retry supervisor counts failures and faults the same way.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use agent_orchestrator::core::{Agent, ExecutionError, Task, TaskExecutor};
///
/// struct AlwaysOk;
///
/// #[async_trait]
/// impl TaskExecutor for AlwaysOk {
///     async fn execute(&self, _task: &Task, _agent: &Agent) -> Result<bool, ExecutionError> {
///         Ok(true)
///     }
/// }
/// ```
#[async_trait]
pub trait TaskExecutor: Send + Sync + 'static {
    /// Execute one attempt of `task` as `agent`.
    ///
    /// The call is not bounded by a timeout; a call that never returns stalls
    /// only this task's attempt sequence.
    async fn execute(&self, task: &Task, agent: &Agent) -> Result<bool, ExecutionError>;
}

#[async_trait]
impl<T: TaskExecutor + ?Sized> TaskExecutor for Arc<T> {
    async fn execute(&self, task: &Task, agent: &Agent) -> Result<bool, ExecutionError> {
        (**self).execute(task, agent).await
    }
}
