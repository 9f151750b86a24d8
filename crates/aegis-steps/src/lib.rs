// Copyright (c) 2025 Aegis Team
// SPDX-License-Identifier: Apache-2.0

//! Workflow step handlers for the Aegis control plane.
//!
//! Each step kind knows how to call one downstream service endpoint and
//! shape the response into a [`StepResult`]. Handlers never propagate
//! transport or remote errors to the pipeline runner; failures are
//! captured into the result.

pub mod discover;
pub mod handler;
pub mod models;
pub mod registry;
pub mod report;
pub mod run_tests;
pub mod submit_bugs;
pub mod verify;

// Re-exports
pub use discover::DiscoverHandler;
pub use handler::{ServiceClient, StepHandler};
pub use models::{RunContext, ServiceEntry, StepAttempt, StepResult};
pub use registry::StepRegistry;
pub use report::ReportHandler;
pub use run_tests::RunTestsHandler;
pub use submit_bugs::SubmitBugsHandler;
pub use verify::VerifyHandler;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
