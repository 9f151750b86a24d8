//! Event model, listener protocol, and multi-listener dispatch.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::error;

/// Emitted once when a workflow run begins.
pub const WORKFLOW_STARTED: &str = "workflow.started";
/// Emitted for every step result, in declaration order.
pub const STEP_COMPLETED: &str = "step.completed";
/// Emitted at most once per run, after the first failing step.
pub const FAILURE_DETECTED: &str = "failure.detected";
/// Emitted once when a workflow run finishes.
pub const WORKFLOW_COMPLETED: &str = "workflow.completed";

/// A typed event emitted during pipeline execution.
///
/// Events are immutable once handed to the emitter; listeners must not
/// modify them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEvent {
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub workflow_name: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl WorkflowEvent {
    /// A new event stamped with the current UTC wall clock.
    pub fn new(
        event_type: impl Into<String>,
        workflow_name: impl Into<String>,
        data: Map<String, Value>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: Utc::now(),
            workflow_name: workflow_name.into(),
            data,
        }
    }
}

/// Outcome of one listener invocation.
pub type ListenerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Consumer of workflow events.
#[async_trait]
pub trait EventListener: Send + Sync {
    async fn on_event(&self, event: &WorkflowEvent) -> ListenerResult;
}

/// Dispatches events to listeners in registration order.
///
/// A listener error is logged and never prevents delivery to the
/// remaining listeners, nor does it surface to the runner.
#[derive(Default)]
pub struct EventEmitter {
    listeners: Vec<Arc<dyn EventListener>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: Arc<dyn EventListener>) {
        self.listeners.push(listener);
    }

    pub async fn emit(&self, event: &WorkflowEvent) {
        for listener in &self.listeners {
            if let Err(err) = listener.on_event(event).await {
                error!(
                    event_type = %event.event_type,
                    workflow = %event.workflow_name,
                    error = %err,
                    "Event listener error"
                );
            }
        }
    }
}
