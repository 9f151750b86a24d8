// Copyright (c) 2025 Aegis Team
// SPDX-License-Identifier: Apache-2.0

//! Core workflow orchestration engine for the Aegis control plane.
//!
//! The engine turns a declarative workflow definition into a correctly
//! sequenced, partially parallel, retried, timed-out execution that
//! emits lifecycle events, persists execution history, and returns a
//! structured [`WorkflowResult`].

pub mod batch;
pub mod condition;
pub mod config;
pub mod health;
pub mod registry;
pub mod result;
pub mod runner;

// Re-exports
pub use config::{
    load_config, AegisConfig, AegisIdentity, ConfigError, HistoryBackend, HistorySettings,
    StepDef, WorkflowDef, CONFIG_FILENAME,
};
pub use health::HealthResult;
pub use registry::{ServiceRegistry, ServiceStatus};
pub use result::WorkflowResult;
pub use runner::{emitter_from_config, PipelineRunner};

// The leaf crates this engine composes.
pub use aegis_events as events;
pub use aegis_history as history;
pub use aegis_steps as steps;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
