// Copyright (c) 2025 Aegis Team
// SPDX-License-Identifier: Apache-2.0

//! Data models shared by step handlers and the pipeline runner.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A downstream service as declared in configuration. Immutable per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Display name used in results and status output.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Base URL of the service.
    pub url: String,
    /// Path of the health endpoint, joined onto the base URL.
    #[serde(default = "default_health_endpoint")]
    pub health_endpoint: String,
    /// Name of the environment variable holding the API key, if any.
    #[serde(default)]
    pub api_key_env: String,
    /// Optional feature tags.
    #[serde(default)]
    pub features: Vec<String>,
}

fn default_health_endpoint() -> String {
    "/health".to_string()
}

/// One execution attempt of a step, as recorded by the runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepAttempt {
    /// 1-based attempt number.
    pub attempt: u32,
    /// Whether this attempt succeeded.
    pub success: bool,
    /// Error message when the attempt failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall time of this attempt in milliseconds.
    pub duration_ms: f64,
}

/// Result of a single workflow step.
///
/// Produced by a handler (or synthesized by the runner for skips,
/// timeouts and resolution failures), then finalized once by the runner
/// with `attempts` and `duration_ms`. Immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_type: String,
    /// Display name of the service the step ran against.
    pub service: String,
    pub success: bool,
    #[serde(default)]
    pub skipped: bool,
    /// Handler-defined payload; conventionally carries a `failures` list.
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall time of the final attempt in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    /// All attempts, oldest first. Empty for skipped steps and steps
    /// that failed before handler resolution.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<StepAttempt>,
}

impl StepResult {
    /// A successful result carrying handler data.
    pub fn ok(step_type: impl Into<String>, service: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            step_type: step_type.into(),
            service: service.into(),
            success: true,
            skipped: false,
            data,
            error: None,
            duration_ms: None,
            attempts: Vec::new(),
        }
    }

    /// A failed result with a captured error message.
    pub fn failed(
        step_type: impl Into<String>,
        service: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            step_type: step_type.into(),
            service: service.into(),
            success: false,
            skipped: false,
            data: Map::new(),
            error: Some(error.into()),
            duration_ms: None,
            attempts: Vec::new(),
        }
    }

    /// A skipped result. Skips count as successful and carry no attempts.
    pub fn skipped(
        step_type: impl Into<String>,
        service: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let mut data = Map::new();
        data.insert("message".to_string(), Value::String(message.into()));
        Self {
            step_type: step_type.into(),
            service: service.into(),
            success: true,
            skipped: true,
            data,
            error: None,
            duration_ms: None,
            attempts: Vec::new(),
        }
    }

    /// Whether this step surfaced failures: either the step itself
    /// failed, or its data carries a non-empty `failures` list.
    pub fn has_failures(&self) -> bool {
        if !self.success {
            return true;
        }
        self.data
            .get("failures")
            .and_then(Value::as_array)
            .is_some_and(|failures| !failures.is_empty())
    }
}

/// Per-run mutable context carrying accumulated step results.
///
/// Owned by the running workflow; results are appended in declaration
/// order. Parallel peers observe the snapshot taken before their batch
/// started, because the runner only appends after the batch completes.
#[derive(Debug, Default)]
pub struct RunContext {
    step_results: Vec<StepResult>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finished step result.
    pub fn push(&mut self, result: StepResult) {
        self.step_results.push(result);
    }

    /// Results accumulated so far, in declaration order.
    pub fn results(&self) -> &[StepResult] {
        &self.step_results
    }

    /// Every entry of every prior result's `failures` list, flattened.
    pub fn collect_failures(&self) -> Vec<Value> {
        self.step_results
            .iter()
            .filter_map(|result| result.data.get("failures"))
            .filter_map(Value::as_array)
            .flatten()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result_with_failures(failures: Value) -> StepResult {
        let mut data = Map::new();
        data.insert("failures".to_string(), failures);
        StepResult::ok("test", "QA Agent", data)
    }

    #[test]
    fn test_failed_step_has_failures() {
        let result = StepResult::failed("discover", "QA Agent", "connection refused");
        assert!(result.has_failures());
        assert_eq!(result.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_empty_failures_list_is_clean() {
        let result = result_with_failures(json!([]));
        assert!(!result.has_failures());
    }

    #[test]
    fn test_nonempty_failures_list() {
        let result = result_with_failures(json!([{"test": "login"}]));
        assert!(result.has_failures());
    }

    #[test]
    fn test_skipped_step_is_successful_without_attempts() {
        let result = StepResult::skipped("submit_bugs", "Bugalizer", "Skipped: condition 'has_failures' not met");
        assert!(result.success);
        assert!(result.skipped);
        assert!(result.error.is_none());
        assert!(result.attempts.is_empty());
        assert!(!result.has_failures());
    }

    #[test]
    fn test_context_collects_failures_across_steps() {
        let mut context = RunContext::new();
        context.push(result_with_failures(json!([{"test": "a"}])));
        context.push(StepResult::ok("discover", "QA Agent", Map::new()));
        context.push(result_with_failures(json!([{"test": "b"}, {"test": "c"}])));

        let failures = context.collect_failures();
        assert_eq!(failures.len(), 3);
    }

    #[test]
    fn test_service_entry_defaults() {
        let entry: ServiceEntry = serde_yaml_like_entry();
        assert_eq!(entry.health_endpoint, "/health");
        assert!(entry.api_key_env.is_empty());
        assert!(entry.features.is_empty());
    }

    fn serde_yaml_like_entry() -> ServiceEntry {
        serde_json::from_value(json!({
            "name": "QA Agent",
            "url": "http://localhost:9000"
        }))
        .unwrap()
    }
}
