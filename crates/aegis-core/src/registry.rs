// Copyright (c) 2025 Aegis Team
// SPDX-License-Identifier: Apache-2.0

//! Service registry: resolves configured services and checks health.

use crate::config::AegisConfig;
use crate::health::{check_all_services, check_health, HealthResult};
use aegis_steps::ServiceEntry;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Registry of downstream services, read-only during execution.
pub struct ServiceRegistry {
    services: HashMap<String, ServiceEntry>,
}

/// Full status of a registered service.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub key: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub features: Vec<String>,
    pub health: Option<HealthResult>,
}

impl ServiceStatus {
    pub fn status_label(&self) -> &'static str {
        match &self.health {
            None => "unknown",
            Some(health) if health.healthy => "healthy",
            Some(health) => match &health.error {
                Some(error) if error.to_lowercase().contains("connect") => "unreachable",
                _ => "unhealthy",
            },
        }
    }
}

impl ServiceRegistry {
    pub fn new(config: &AegisConfig) -> Self {
        Self {
            services: config.services.clone(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ServiceEntry> {
        self.services.get(key)
    }

    pub fn service_keys(&self) -> Vec<&str> {
        self.services.keys().map(String::as_str).collect()
    }

    pub async fn check_one(&self, key: &str, timeout: Duration) -> HealthResult {
        match self.services.get(key) {
            Some(entry) => check_health(entry, timeout).await,
            None => HealthResult {
                healthy: false,
                status_code: None,
                latency_ms: 0.0,
                error: Some(format!("Unknown service: {key}")),
            },
        }
    }

    pub async fn check_all(&self, timeout: Duration) -> HashMap<String, HealthResult> {
        check_all_services(&self.services, timeout).await
    }

    /// Status rows for every registered service, health included.
    pub async fn statuses(&self, timeout: Duration) -> Vec<ServiceStatus> {
        let mut health_map = self.check_all(timeout).await;
        let mut statuses: Vec<ServiceStatus> = self
            .services
            .iter()
            .map(|(key, entry)| ServiceStatus {
                key: key.clone(),
                name: entry.name.clone(),
                description: entry.description.clone(),
                url: entry.url.clone(),
                features: entry.features.clone(),
                health: health_map.remove(key),
            })
            .collect();
        statuses.sort_by(|a, b| a.key.cmp(&b.key));
        statuses
    }
}
