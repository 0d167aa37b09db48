//! Runtime adapters and the caller-facing API surface.

pub mod api;
pub mod tokio_spawner;

pub use api::{
    health, list_agents, register_agent, submit_task, task_status, AgentRegistration,
    AgentSnapshot, Health, TaskStatusResponse, TaskSubmission,
};
pub use tokio_spawner::TokioSpawner;
