//! Named workflow templates: ordered sequences of task identifiers.
//!
//! Templates are stored for callers that compose multi-step work. They do not
//! drive execution; each referenced task is scheduled on its own.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::error::OrchestratorError;
use super::task::TaskId;

/// Registry of workflow templates.
#[derive(Default)]
pub struct WorkflowRegistry {
    workflows: RwLock<HashMap<String, Vec<TaskId>>>,
}

impl WorkflowRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a template. Fails if the id is taken.
    pub fn create(
        &self,
        id: impl Into<String>,
        sequence: Vec<TaskId>,
    ) -> Result<(), OrchestratorError> {
        let id = id.into();
        let mut workflows = self.workflows.write();
        if workflows.contains_key(&id) {
            return Err(OrchestratorError::DuplicateWorkflow(id));
        }
        tracing::info!(workflow = %id, steps = sequence.len(), "created workflow");
        workflows.insert(id, sequence);
        Ok(())
    }

    /// Task sequence of a template.
    pub fn get(&self, id: &str) -> Option<Vec<TaskId>> {
        self.workflows.read().get(id).cloned()
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.workflows.read().len()
    }

    /// Whether no template exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
