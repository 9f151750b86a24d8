// Copyright (c) 2025 Aegis Team
// SPDX-License-Identifier: Apache-2.0

//! The step handler contract and the shared downstream HTTP client.

use crate::models::{RunContext, ServiceEntry, StepResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

/// A stateless workflow step operation.
///
/// Handlers are constructed from a [`ServiceEntry`] and perform one call
/// against the downstream service. They must capture any transport or
/// remote error into a failing [`StepResult`] rather than returning an
/// error to the runner.
#[async_trait]
pub trait StepHandler: Send + Sync {
    /// The step-type tag this handler is registered under.
    fn step_type(&self) -> &'static str;

    /// Execute the step against the accumulated run context.
    async fn execute(&self, context: &RunContext) -> StepResult;
}

/// HTTP client bound to one downstream service.
///
/// Resolves the API key from the environment variable named by the
/// service entry at construction and attaches it as `X-API-Key` on every
/// request when present.
pub struct ServiceClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ServiceClient {
    pub fn new(entry: &ServiceEntry) -> Self {
        let api_key = if entry.api_key_env.is_empty() {
            String::new()
        } else {
            std::env::var(&entry.api_key_env).unwrap_or_default()
        };

        Self {
            client: Client::new(),
            base_url: entry.url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            builder
        } else {
            builder.header("X-API-Key", &self.api_key)
        }
    }

    /// GET a JSON document from `{base_url}{path}`.
    pub async fn get_json(&self, path: &str) -> Result<Value, reqwest::Error> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.request(self.client.get(&url)).send().await?;
        response.error_for_status()?.json().await
    }

    /// POST a JSON payload to `{base_url}{path}` and decode the response.
    pub async fn post_json(&self, path: &str, payload: &Value) -> Result<Value, reqwest::Error> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.request(self.client.post(&url)).json(payload).send().await?;
        response.error_for_status()?.json().await
    }
}
