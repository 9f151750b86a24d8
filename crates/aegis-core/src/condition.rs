// Copyright (c) 2025 Aegis Team
// SPDX-License-Identifier: Apache-2.0

//! Step condition evaluation against accumulated results.

use aegis_steps::StepResult;
use tracing::warn;

/// Decide whether a step must be skipped given its condition and the
/// results accumulated so far.
///
/// Unknown conditions fail open: the step runs and a warning is logged.
pub fn should_skip(condition: Option<&str>, results: &[StepResult]) -> bool {
    let Some(condition) = condition else {
        return false;
    };

    match condition {
        // Run only when some prior step surfaced failures.
        "has_failures" => !results.iter().any(StepResult::has_failures),
        // Run only while everything so far succeeded.
        "on_success" => results.iter().any(|r| !r.success),
        // Run only after something failed.
        "on_failure" => results.iter().all(|r| r.success),
        "always" => false,
        other => {
            warn!(condition = %other, "Unknown condition; running step anyway");
            false
        }
    }
}
