// Copyright (c) 2025 Aegis Team
// SPDX-License-Identifier: Apache-2.0

//! Step-kind registry: maps a step-type tag to a handler constructor.

use crate::discover::DiscoverHandler;
use crate::handler::StepHandler;
use crate::models::ServiceEntry;
use crate::report::ReportHandler;
use crate::run_tests::RunTestsHandler;
use crate::submit_bugs::SubmitBugsHandler;
use crate::verify::VerifyHandler;
use std::collections::HashMap;
use std::sync::Arc;

/// Constructor for a step handler, given the service it will run against.
pub type HandlerFactory = Box<dyn Fn(&ServiceEntry) -> Arc<dyn StepHandler> + Send + Sync>;

/// Closed family of step kinds keyed by a string tag.
///
/// The built-in set covers the five step kinds of the QA pipeline;
/// additional kinds can be registered for embedding hosts and tests.
pub struct StepRegistry {
    factories: HashMap<String, HandlerFactory>,
}

impl StepRegistry {
    /// An empty registry with no step kinds.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a handler constructor under a tag, replacing any
    /// previous registration.
    pub fn register(
        &mut self,
        step_type: impl Into<String>,
        factory: impl Fn(&ServiceEntry) -> Arc<dyn StepHandler> + Send + Sync + 'static,
    ) {
        self.factories.insert(step_type.into(), Box::new(factory));
    }

    /// Construct a handler for `step_type` bound to `entry`, or `None`
    /// when the tag is unknown.
    pub fn create(&self, step_type: &str, entry: &ServiceEntry) -> Option<Arc<dyn StepHandler>> {
        self.factories.get(step_type).map(|factory| factory(entry))
    }

    /// Registered tags, unordered.
    pub fn step_types(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl Default for StepRegistry {
    /// Registry with the built-in step kinds.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("discover", |entry| Arc::new(DiscoverHandler::new(entry)));
        registry.register("test", |entry| Arc::new(RunTestsHandler::new(entry)));
        registry.register("verify", |entry| Arc::new(VerifyHandler::new(entry)));
        registry.register("submit_bugs", |entry| Arc::new(SubmitBugsHandler::new(entry)));
        registry.register("report", |entry| Arc::new(ReportHandler::new(entry)));
        registry
    }
}
