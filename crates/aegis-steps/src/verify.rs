// Copyright (c) 2025 Aegis Team
// SPDX-License-Identifier: Apache-2.0

//! Verification step.

use crate::handler::{ServiceClient, StepHandler};
use crate::models::{RunContext, ServiceEntry, StepResult};
use crate::run_tests::run_summary;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Runs the downstream service in verify-only mode:
/// `POST {base}/api/runs` with `{verify_only: true}`.
pub struct VerifyHandler {
    service_name: String,
    http: ServiceClient,
}

impl VerifyHandler {
    pub fn new(entry: &ServiceEntry) -> Self {
        Self {
            service_name: entry.name.clone(),
            http: ServiceClient::new(entry),
        }
    }
}

#[async_trait]
impl StepHandler for VerifyHandler {
    fn step_type(&self) -> &'static str {
        "verify"
    }

    async fn execute(&self, _context: &RunContext) -> StepResult {
        match self
            .http
            .post_json("/api/runs", &json!({"verify_only": true}))
            .await
        {
            Ok(body) => {
                let mut data = run_summary(&body);
                data.insert("verify_only".to_string(), Value::Bool(true));
                StepResult::ok(self.step_type(), &self.service_name, data)
            }
            Err(err) => StepResult::failed(self.step_type(), &self.service_name, err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_verify_posts_verify_only_flag() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/runs")
            .match_body(mockito::Matcher::Json(json!({"verify_only": true})))
            .with_status(200)
            .with_body(r#"{"total": 1, "passed": 1, "failed": 0, "failures": []}"#)
            .create_async()
            .await;

        let entry = ServiceEntry {
            name: "QA Agent".to_string(),
            description: String::new(),
            url: server.url(),
            health_endpoint: "/health".to_string(),
            api_key_env: String::new(),
            features: Vec::new(),
        };

        let handler = VerifyHandler::new(&entry);
        let result = handler.execute(&RunContext::new()).await;

        assert!(result.success);
        assert_eq!(result.data["verify_only"], true);
        assert_eq!(result.data["passed"], 1);
        mock.assert_async().await;
    }
}
