//! Configuration models for the orchestrator and its agents.

pub mod orchestrator;

pub use orchestrator::{DeploymentConfig, OrchestratorConfig, ENV_PREFIX};
