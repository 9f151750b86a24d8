// Copyright (c) 2025 Aegis Team
// SPDX-License-Identifier: Apache-2.0

//! Typed configuration models for the `.aegis.yaml` document.

mod loader;

pub use loader::{find_config_file, load_config, ConfigError, CONFIG_FILENAME};

use aegis_events::WebhookConfig;
use aegis_steps::ServiceEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level identity metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AegisIdentity {
    #[serde(default = "default_identity_name")]
    pub name: String,
    #[serde(default = "default_identity_version")]
    pub version: String,
}

fn default_identity_name() -> String {
    "Aegis".to_string()
}

fn default_identity_version() -> String {
    "0.1.0".to_string()
}

impl Default for AegisIdentity {
    fn default() -> Self {
        Self {
            name: default_identity_name(),
            version: default_identity_version(),
        }
    }
}

/// A single step in a workflow pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDef {
    /// Step-kind tag resolved through the step registry.
    #[serde(rename = "type")]
    pub step_type: String,
    /// Key of the service this step runs against.
    pub service: String,
    /// Optional condition controlling whether the step executes.
    #[serde(default)]
    pub condition: Option<String>,
    /// Consecutive parallel steps form one concurrently executed batch.
    #[serde(default)]
    pub parallel: bool,
    /// Extra attempts after the first failure.
    #[serde(default)]
    pub retries: u32,
    /// Base backoff delay; doubles after each failed attempt.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: f64,
    /// Hard per-attempt deadline enforced by the runner.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
}

fn default_retry_delay() -> f64 {
    1.0
}

fn default_timeout() -> f64 {
    30.0
}

/// A named workflow pipeline definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDef {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<StepDef>,
}

/// Which history backend the engine records executions into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Execution history settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySettings {
    #[serde(default)]
    pub backend: HistoryBackend,
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Newest runs kept per workflow; 0 keeps everything.
    #[serde(default)]
    pub max_records: u32,
}

fn default_db_path() -> String {
    "aegis_history.db".to_string()
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            backend: HistoryBackend::Memory,
            db_path: default_db_path(),
            max_records: 0,
        }
    }
}

/// Root configuration model for `.aegis.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AegisConfig {
    #[serde(default)]
    pub aegis: AegisIdentity,
    #[serde(default)]
    pub services: HashMap<String, ServiceEntry>,
    #[serde(default)]
    pub workflows: HashMap<String, WorkflowDef>,
    #[serde(default)]
    pub webhooks: Vec<WebhookConfig>,
    #[serde(default)]
    pub history: HistorySettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_def_defaults() {
        let step: StepDef = serde_yaml::from_str("{type: discover, service: qaagent}").unwrap();
        assert_eq!(step.step_type, "discover");
        assert!(step.condition.is_none());
        assert!(!step.parallel);
        assert_eq!(step.retries, 0);
        assert_eq!(step.retry_delay_seconds, 1.0);
        assert_eq!(step.timeout_seconds, 30.0);
    }

    #[test]
    fn test_history_backend_tags() {
        let settings: HistorySettings = serde_yaml::from_str("{backend: sqlite, max_records: 25}").unwrap();
        assert_eq!(settings.backend, HistoryBackend::Sqlite);
        assert_eq!(settings.max_records, 25);
        assert_eq!(settings.db_path, "aegis_history.db");
    }

    #[test]
    fn test_empty_document_is_valid() {
        let config: AegisConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.aegis.name, "Aegis");
        assert!(config.services.is_empty());
        assert!(config.workflows.is_empty());
        assert!(config.webhooks.is_empty());
        assert_eq!(config.history.backend, HistoryBackend::Memory);
    }
}
