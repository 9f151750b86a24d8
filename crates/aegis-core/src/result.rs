// Copyright (c) 2025 Aegis Team
// SPDX-License-Identifier: Apache-2.0

//! Aggregate result of a workflow run.

use aegis_steps::StepResult;
use serde::{Deserialize, Serialize};

/// Result of a full workflow execution. Steps appear in declaration
/// order regardless of how they were batched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub workflow_name: String,
    pub steps: Vec<StepResult>,
}

impl WorkflowResult {
    /// A run succeeds when every step either succeeded or was skipped.
    pub fn success(&self) -> bool {
        self.steps.iter().all(|s| s.success || s.skipped)
    }

    /// Whether any step surfaced failures.
    pub fn has_failures(&self) -> bool {
        self.steps.iter().any(StepResult::has_failures)
    }
}
