// Copyright (c) 2025 Aegis Team
// SPDX-License-Identifier: Apache-2.0

//! Report step: internal summarizer, no HTTP.

use crate::handler::StepHandler;
use crate::models::{RunContext, ServiceEntry, StepResult};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// Aggregates the results accumulated so far into a structured summary.
pub struct ReportHandler {
    service_name: String,
}

impl ReportHandler {
    pub fn new(entry: &ServiceEntry) -> Self {
        Self {
            service_name: entry.name.clone(),
        }
    }
}

#[async_trait]
impl StepHandler for ReportHandler {
    fn step_type(&self) -> &'static str {
        "report"
    }

    async fn execute(&self, context: &RunContext) -> StepResult {
        let results = context.results();
        let passed = results.iter().filter(|r| r.success && !r.skipped).count();
        let failed = results.iter().filter(|r| !r.success && !r.skipped).count();
        let skipped = results.iter().filter(|r| r.skipped).count();
        let total_duration_ms: f64 = results.iter().filter_map(|r| r.duration_ms).sum();

        let steps: Vec<Value> = results
            .iter()
            .map(|r| {
                json!({
                    "step_type": r.step_type,
                    "service": r.service,
                    "success": r.success,
                    "skipped": r.skipped,
                    "duration_ms": r.duration_ms,
                    "error": r.error,
                })
            })
            .collect();

        let mut data = Map::new();
        data.insert(
            "summary".to_string(),
            json!({
                "total": results.len(),
                "passed": passed,
                "failed": failed,
                "skipped": skipped,
            }),
        );
        data.insert("total_duration_ms".to_string(), json!(total_duration_ms));
        data.insert("steps".to_string(), Value::Array(steps));

        StepResult::ok(self.step_type(), &self.service_name, data)
    }
}
