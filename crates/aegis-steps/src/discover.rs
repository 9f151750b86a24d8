// Copyright (c) 2025 Aegis Team
// SPDX-License-Identifier: Apache-2.0

//! Route discovery step.

use crate::handler::{ServiceClient, StepHandler};
use crate::models::{RunContext, ServiceEntry, StepResult};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Discovers the routes a downstream service exposes via
/// `GET {base}/api/routes`.
pub struct DiscoverHandler {
    service_name: String,
    http: ServiceClient,
}

impl DiscoverHandler {
    pub fn new(entry: &ServiceEntry) -> Self {
        Self {
            service_name: entry.name.clone(),
            http: ServiceClient::new(entry),
        }
    }
}

#[async_trait]
impl StepHandler for DiscoverHandler {
    fn step_type(&self) -> &'static str {
        "discover"
    }

    async fn execute(&self, _context: &RunContext) -> StepResult {
        match self.http.get_json("/api/routes").await {
            Ok(body) => {
                let routes = body
                    .get("routes")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();

                let mut data = Map::new();
                data.insert("route_count".to_string(), Value::from(routes.len()));
                data.insert("routes".to_string(), Value::Array(routes));
                StepResult::ok(self.step_type(), &self.service_name, data)
            }
            Err(err) => StepResult::failed(self.step_type(), &self.service_name, err.to_string()),
        }
    }
}
