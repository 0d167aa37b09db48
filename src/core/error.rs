//! Error types for orchestration operations.

use thiserror::Error;

/// Errors surfaced synchronously to callers of the orchestrator.
///
/// Execution-time problems never appear here: they are folded into a failed
/// attempt by the retry supervisor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    /// An agent with this identifier is already registered.
    #[error("duplicate agent: {0}")]
    DuplicateAgent(String),
    /// A task with this identifier has already been submitted.
    #[error("duplicate task: {0}")]
    DuplicateTask(String),
    /// A workflow with this identifier already exists.
    #[error("duplicate workflow: {0}")]
    DuplicateWorkflow(String),
    /// No agent is registered under this identifier.
    #[error("unknown agent: {0}")]
    UnknownAgent(String),
    /// No task is registered under this identifier.
    #[error("unknown task: {0}")]
    UnknownTask(String),
    /// A task type tag or capability tag is not a known task kind.
    #[error("unsupported task kind: {0}")]
    UnsupportedTaskKind(String),
    /// A submitted task is not in a submittable state.
    #[error("invalid task: {0}")]
    InvalidTask(String),
    /// Configuration failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Fault raised while executing a task, as opposed to a reported failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// A required payload field is missing or has the wrong type.
    #[error("invalid payload field `{field}`: {reason}")]
    InvalidPayload {
        /// Payload field name.
        field: String,
        /// What was wrong with it.
        reason: String,
    },
    /// The external collaborator failed.
    #[error("executor fault: {0}")]
    Fault(String),
}

impl ExecutionError {
    /// Shorthand for a missing or ill-typed payload field.
    pub fn invalid_payload(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
