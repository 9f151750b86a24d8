// Copyright (c) 2025 Aegis Team
// SPDX-License-Identifier: Apache-2.0

//! Bug submission step.

use crate::handler::{ServiceClient, StepHandler};
use crate::models::{RunContext, ServiceEntry, StepResult};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

/// Forwards test failures collected from prior steps to the bug tracker
/// via `POST {base}/api/v1/reports`. Skips the network call entirely
/// when no prior step surfaced failures.
pub struct SubmitBugsHandler {
    service_name: String,
    http: ServiceClient,
}

impl SubmitBugsHandler {
    pub fn new(entry: &ServiceEntry) -> Self {
        Self {
            service_name: entry.name.clone(),
            http: ServiceClient::new(entry),
        }
    }
}

#[async_trait]
impl StepHandler for SubmitBugsHandler {
    fn step_type(&self) -> &'static str {
        "submit_bugs"
    }

    async fn execute(&self, context: &RunContext) -> StepResult {
        let failures = context.collect_failures();
        if failures.is_empty() {
            debug!(service = %self.service_name, "No failures to submit");
            let mut data = Map::new();
            data.insert("submitted".to_string(), Value::from(0));
            data.insert(
                "message".to_string(),
                Value::String("No failures to submit".to_string()),
            );
            return StepResult::ok(self.step_type(), &self.service_name, data);
        }

        let submitted = failures.len();
        match self
            .http
            .post_json("/api/v1/reports", &json!({"failures": failures}))
            .await
        {
            Ok(body) => {
                let mut data = Map::new();
                data.insert("submitted".to_string(), Value::from(submitted));
                data.insert("response".to_string(), body);
                StepResult::ok(self.step_type(), &self.service_name, data)
            }
            Err(err) => StepResult::failed(self.step_type(), &self.service_name, err.to_string()),
        }
    }
}
