//! Workflow event system for Aegis.
//!
//! The pipeline runner emits [`WorkflowEvent`]s at workflow and step
//! boundaries; an [`EventEmitter`] fans them out to listeners. The crate
//! ships two listeners: a bounded in-memory [`EventLog`] ring and a
//! fire-and-forget [`WebhookListener`] with HMAC-SHA256 signing.

pub mod emitter;
pub mod log;
pub mod webhook;

pub use emitter::{
    EventEmitter, EventListener, ListenerResult, WorkflowEvent, FAILURE_DETECTED, STEP_COMPLETED,
    WORKFLOW_COMPLETED, WORKFLOW_STARTED,
};
pub use log::EventLog;
pub use webhook::{WebhookConfig, WebhookListener};
