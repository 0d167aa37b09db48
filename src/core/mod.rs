//! Core scheduling abstractions: agents, tasks, selection, retries, and the tick loop.

pub mod agent;
pub mod audit;
pub mod error;
pub mod executor;
pub mod health;
pub mod hooks;
pub mod registry;
pub mod retry;
pub mod router;
pub mod scheduler;
pub mod selection;
pub mod task;
pub mod workflow;

pub use agent::{Agent, AgentConfig, AgentId, INITIAL_RELIABILITY};
pub use audit::{
    build_audit_event, AuditAction, AuditEvent, AuditSink, AuditTrail, InMemoryAuditSink,
};
pub use error::{AppResult, ExecutionError, OrchestratorError};
pub use executor::TaskExecutor;
pub use health::{HealthAlert, HealthMonitor, HealthThresholds};
pub use hooks::{ContactRecord, DecisionHooks, PermissiveHooks};
pub use registry::{AgentRegistry, TaskRegistry};
pub use retry::{BackoffPolicy, RetrySupervisor, SupervisedOutcome};
pub use router::{Action, KindRouter, Submission, Submitter};
pub use scheduler::{Scheduler, Spawn, StopHandle, TickReport};
pub use selection::{compare_candidates, eligible_agents, select_agent};
pub use task::{Payload, Task, TaskId, TaskKind, TaskStatus};
pub use workflow::WorkflowRegistry;
