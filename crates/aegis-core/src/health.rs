// Copyright (c) 2025 Aegis Team
// SPDX-License-Identifier: Apache-2.0

//! Health probes for downstream services.

use aegis_steps::ServiceEntry;
use futures::future::join_all;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Result of a single health check.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResult {
    pub healthy: bool,
    pub status_code: Option<u16>,
    pub latency_ms: f64,
    pub error: Option<String>,
}

fn round_ms(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 10_000.0).round() / 10.0
}

/// GET the service's health endpoint. Healthy means HTTP 200; connect
/// and timeout failures are classified into the error message.
pub async fn check_health(entry: &ServiceEntry, timeout: Duration) -> HealthResult {
    let url = format!(
        "{}{}",
        entry.url.trim_end_matches('/'),
        entry.health_endpoint
    );
    let client = Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client");

    let start = Instant::now();
    match client.get(&url).send().await {
        Ok(response) => HealthResult {
            healthy: response.status().as_u16() == 200,
            status_code: Some(response.status().as_u16()),
            latency_ms: round_ms(start.elapsed()),
            error: None,
        },
        Err(err) if err.is_timeout() => HealthResult {
            healthy: false,
            status_code: None,
            latency_ms: round_ms(start.elapsed()),
            error: Some("Timeout".to_string()),
        },
        Err(err) if err.is_connect() => HealthResult {
            healthy: false,
            status_code: None,
            latency_ms: round_ms(start.elapsed()),
            error: Some(format!("Connection refused: {err}")),
        },
        Err(err) => HealthResult {
            healthy: false,
            status_code: None,
            latency_ms: round_ms(start.elapsed()),
            error: Some(err.to_string()),
        },
    }
}

/// Run health checks for all services concurrently.
pub async fn check_all_services(
    services: &HashMap<String, ServiceEntry>,
    timeout: Duration,
) -> HashMap<String, HealthResult> {
    let checks = services
        .iter()
        .map(|(key, entry)| async move { (key.clone(), check_health(entry, timeout).await) });
    join_all(checks).await.into_iter().collect()
}
