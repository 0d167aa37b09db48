//! Audit sink implementations.
//!
//! Every orchestration event is also logged through `tracing`; the audit trail
//! is the machine-readable copy for callers that want to inspect it.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::util::clock::{Clock, SystemClock};

/// Kind of orchestration event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Agent registered.
    Register,
    /// Agent deactivated.
    Deactivate,
    /// Task submitted.
    Submit,
    /// Task handed to a retry supervisor.
    Dispatch,
    /// One attempt failed (reported failure or fault).
    AttemptFailed,
    /// Task completed.
    Complete,
    /// Task failed after its last attempt.
    Fail,
    /// Health monitor raised an alert.
    HealthAlert,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Register => "register",
            Self::Deactivate => "deactivate",
            Self::Submit => "submit",
            Self::Dispatch => "dispatch",
            Self::AttemptFailed => "attempt_failed",
            Self::Complete => "complete",
            Self::Fail => "fail",
            Self::HealthAlert => "health_alert",
        };
        f.write_str(s)
    }
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Related task identifier.
    pub task_id: Option<String>,
    /// Related agent identifier.
    pub agent_id: Option<String>,
    /// Action taken.
    pub action: AuditAction,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: Mutex<VecDeque<AuditEvent>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Stored events with the given action.
    pub fn events_with(&self, action: AuditAction) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an audit event stamped at `created_at_ms`.
pub fn build_audit_event(
    action: AuditAction,
    task_id: Option<&str>,
    agent_id: Option<&str>,
    detail: Option<String>,
    created_at_ms: u128,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        task_id: task_id.map(str::to_string),
        agent_id: agent_id.map(str::to_string),
        action,
        created_at_ms,
        detail,
    }
}

/// Optional sink shared by the scheduler and its retry supervisors.
///
/// Events are stamped with the trail's clock, which the scheduler sets to
/// its own so audit times line up with task and agent timestamps.
#[derive(Clone)]
pub struct AuditTrail {
    sink: Option<Arc<dyn AuditSink>>,
    clock: Arc<dyn Clock>,
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::disabled()
    }
}

impl AuditTrail {
    /// Trail that forwards to `sink`.
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink: Some(sink),
            clock: Arc::new(SystemClock),
        }
    }

    /// Trail that drops every event.
    pub fn disabled() -> Self {
        Self {
            sink: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Stamp events with `clock` instead of the system clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Record an event if a sink is attached.
    pub fn emit(
        &self,
        action: AuditAction,
        task_id: Option<&str>,
        agent_id: Option<&str>,
        detail: Option<String>,
    ) {
        if let Some(sink) = &self.sink {
            let at = self.clock.now_ms();
            sink.record(build_audit_event(action, task_id, agent_id, detail, at));
        }
    }
}

impl fmt::Debug for AuditTrail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditTrail")
            .field("enabled", &self.sink.is_some())
            .finish()
    }
}
