//! # Agent Orchestrator
//!
//! A task/agent scheduling engine for automated operations.
//!
//! Agents declare the task kinds they can execute, a priority, a retry
//! ceiling, and a minimum reliability. Tasks carry a kind, a target, an
//! earliest execution time, and a payload. A periodic tick loop picks up due
//! tasks, routes each one to the best eligible agent, and supervises the
//! execution with exponential backoff, while a health monitor flags idle or
//! unreliable agents.
//!
//! ## Key Features
//!
//! - **Capability Routing**: Only active agents that declare a task's kind and
//!   meet their own reliability threshold are candidates
//! - **Deterministic Selection**: Highest priority wins, then highest
//!   reliability, then registration order
//! - **Supervised Retries**: `max_retries + 1` attempts with `2^attempt`
//!   backoff, every attempt feeding the agent's running reliability
//! - **Fault Isolation**: Executor panics count as failed attempts, and a
//!   faulted tick pauses the loop instead of ending it
//! - **Health Checks**: Inactivity and low-reliability alerts on every tick
//! - **Pluggable Execution**: Bring your own [`core::TaskExecutor`], or use
//!   [`core::KindRouter`] with decision hooks and a submission backend
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use agent_orchestrator::builders::SchedulerBuilder;
//! use agent_orchestrator::config::DeploymentConfig;
//! use agent_orchestrator::runtime::TokioSpawner;
//!
//! let deployment = DeploymentConfig::from_json_str(&std::fs::read_to_string("agents.json")?)?;
//! let scheduler = Arc::new(
//!     SchedulerBuilder::new(deployment).build(my_executor, TokioSpawner::current())?,
//! );
//! scheduler.start();
//! ```
//!
//! ## Module Overview
//!
//! - [`core`]: registries, selection, retry supervision, the tick loop, health
//! - [`config`]: orchestrator tunables and deployment files
//! - [`builders`]: construct a scheduler from a deployment
//! - [`runtime`]: tokio spawner and request/response models
//! - [`util`]: clocks and tracing setup

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions, registries, and execution supervision.
pub mod core;
/// Configuration models for the orchestrator and its agents.
pub mod config;
/// Builders to construct schedulers from configuration.
pub mod builders;
/// Runtime adapters and API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
