// Copyright (c) 2025 Aegis Team
// SPDX-License-Identifier: Apache-2.0

//! Test execution step.

use crate::handler::{ServiceClient, StepHandler};
use crate::models::{RunContext, ServiceEntry, StepResult};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// Triggers a test run on the downstream service via
/// `POST {base}/api/runs` and surfaces its pass/fail counts.
pub struct RunTestsHandler {
    service_name: String,
    http: ServiceClient,
}

impl RunTestsHandler {
    pub fn new(entry: &ServiceEntry) -> Self {
        Self {
            service_name: entry.name.clone(),
            http: ServiceClient::new(entry),
        }
    }
}

/// Copies the `total`/`passed`/`failed`/`failures` contract fields out
/// of a run response, defaulting absent counters to zero.
pub(crate) fn run_summary(body: &Value) -> Map<String, Value> {
    let mut data = Map::new();
    for key in ["total", "passed", "failed"] {
        data.insert(key.to_string(), body.get(key).cloned().unwrap_or(json!(0)));
    }
    data.insert(
        "failures".to_string(),
        body.get("failures").cloned().unwrap_or(json!([])),
    );
    data
}

#[async_trait]
impl StepHandler for RunTestsHandler {
    fn step_type(&self) -> &'static str {
        "test"
    }

    async fn execute(&self, _context: &RunContext) -> StepResult {
        match self.http.post_json("/api/runs", &json!({})).await {
            Ok(body) => StepResult::ok(self.step_type(), &self.service_name, run_summary(&body)),
            Err(err) => StepResult::failed(self.step_type(), &self.service_name, err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_for(url: String) -> ServiceEntry {
        ServiceEntry {
            name: "QA Agent".to_string(),
            description: String::new(),
            url,
            health_endpoint: "/health".to_string(),
            api_key_env: String::new(),
            features: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_run_surfaces_counts_and_failures() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/runs")
            .with_status(200)
            .with_body(r#"{"total": 5, "passed": 3, "failed": 2, "failures": [{"t": "a"}, {"t": "b"}]}"#)
            .create_async()
            .await;

        let handler = RunTestsHandler::new(&entry_for(server.url()));
        let result = handler.execute(&RunContext::new()).await;

        assert!(result.success);
        assert_eq!(result.data["total"], 5);
        assert_eq!(result.data["failed"], 2);
        assert_eq!(result.data["failures"].as_array().unwrap().len(), 2);
        assert!(result.has_failures());
    }

    #[tokio::test]
    async fn test_missing_fields_default_to_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/runs")
            .with_status(200)
            .with_body(r#"{}"#)
            .create_async()
            .await;

        let handler = RunTestsHandler::new(&entry_for(server.url()));
        let result = handler.execute(&RunContext::new()).await;

        assert!(result.success);
        assert_eq!(result.data["total"], 0);
        assert_eq!(result.data["failures"], json!([]));
        assert!(!result.has_failures());
    }

    #[tokio::test]
    async fn test_connection_refused_is_captured() {
        // Unroutable port; no server listening.
        let handler = RunTestsHandler::new(&entry_for("http://127.0.0.1:1".to_string()));
        let result = handler.execute(&RunContext::new()).await;

        assert!(!result.success);
        assert!(result.error.is_some());
    }
}
