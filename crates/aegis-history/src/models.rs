//! Durable projections of workflow execution results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of a single step execution within a workflow run.
///
/// Carries the attempt count rather than per-attempt details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_type: String,
    pub service: String,
    pub success: bool,
    #[serde(default)]
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempts: u32,
}

/// Record of a single workflow execution. Persisted once at run
/// completion; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub workflow_name: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub success: bool,
    pub steps: Vec<StepRecord>,
}

impl ExecutionRecord {
    /// Wall time of the whole run in milliseconds, when completed.
    pub fn duration_ms(&self) -> Option<f64> {
        self.completed_at
            .map(|completed| (completed - self.started_at).num_microseconds().unwrap_or(0) as f64 / 1000.0)
    }
}
