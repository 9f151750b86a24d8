// Copyright (c) 2025 Aegis Team
// SPDX-License-Identifier: Apache-2.0

//! The pipeline runner: batching, conditional skipping, retry with
//! backoff, hard per-step timeouts, parallel fan-out, event emission,
//! and history recording.

use crate::batch::plan_batches;
use crate::condition;
use crate::config::{AegisConfig, StepDef};
use crate::registry::ServiceRegistry;
use crate::result::WorkflowResult;
use aegis_events::{
    EventEmitter, WebhookListener, WorkflowEvent, FAILURE_DETECTED, STEP_COMPLETED,
    WORKFLOW_COMPLETED, WORKFLOW_STARTED,
};
use aegis_history::{ExecutionRecord, HistoryStoreRef, StepRecord};
use aegis_steps::{RunContext, StepAttempt, StepHandler, StepRegistry, StepResult};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Executes named workflows against the configured services.
///
/// Constructed from a config; history and event emission are optional
/// collaborators attached with the builder methods. The sole public
/// operation is [`run`](Self::run), which always returns a
/// [`WorkflowResult`]; step-level failures never escape as errors.
pub struct PipelineRunner {
    config: AegisConfig,
    services: ServiceRegistry,
    steps: StepRegistry,
    history: Option<HistoryStoreRef>,
    emitter: Option<EventEmitter>,
}

/// An emitter wired with the config's webhooks, or `None` when no
/// webhooks are configured.
pub fn emitter_from_config(config: &AegisConfig) -> Option<EventEmitter> {
    if config.webhooks.is_empty() {
        return None;
    }
    let mut emitter = EventEmitter::new();
    emitter.add_listener(Arc::new(WebhookListener::new(config.webhooks.clone())));
    Some(emitter)
}

fn event_data(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl PipelineRunner {
    pub fn new(config: AegisConfig) -> Self {
        let services = ServiceRegistry::new(&config);
        Self {
            config,
            services,
            steps: StepRegistry::default(),
            history: None,
            emitter: None,
        }
    }

    /// Record completed executions into `history`.
    pub fn with_history(mut self, history: HistoryStoreRef) -> Self {
        self.history = Some(history);
        self
    }

    /// Emit lifecycle events through `emitter`.
    pub fn with_emitter(mut self, emitter: EventEmitter) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Replace the step registry, e.g. to add custom step kinds.
    pub fn with_step_registry(mut self, steps: StepRegistry) -> Self {
        self.steps = steps;
        self
    }

    async fn emit(&self, event_type: &str, workflow_name: &str, data: Map<String, Value>) {
        if let Some(emitter) = &self.emitter {
            emitter
                .emit(&WorkflowEvent::new(event_type, workflow_name, data))
                .await;
        }
    }

    /// Execute a named workflow, returning structured results.
    pub async fn run(&self, workflow_name: &str) -> WorkflowResult {
        let Some(workflow) = self.config.workflows.get(workflow_name) else {
            warn!(workflow = %workflow_name, "Unknown workflow requested");
            return WorkflowResult {
                workflow_name: workflow_name.to_string(),
                steps: vec![StepResult::failed(
                    "error",
                    "aegis",
                    format!("Unknown workflow: {workflow_name}"),
                )],
            };
        };

        let started_at: DateTime<Utc> = Utc::now();
        let run_start = Instant::now();
        info!(
            workflow = %workflow_name,
            step_count = workflow.steps.len(),
            "Starting workflow execution"
        );
        self.emit(
            WORKFLOW_STARTED,
            workflow_name,
            event_data(json!({"step_count": workflow.steps.len()})),
        )
        .await;

        let mut context = RunContext::new();
        let mut results: Vec<StepResult> = Vec::with_capacity(workflow.steps.len());
        let mut failure_reported = false;

        for batch in plan_batches(&workflow.steps) {
            let indices = batch.indices();
            // All steps of a parallel batch start against the context
            // snapshot taken here; peer results only land afterwards.
            let batch_results = join_all(
                indices
                    .iter()
                    .map(|&i| self.resolve_and_execute(&workflow.steps[i], &context)),
            )
            .await;

            for step_result in batch_results {
                self.emit_step_events(workflow_name, &step_result, &mut failure_reported)
                    .await;
                context.push(step_result.clone());
                results.push(step_result);
            }
        }

        let completed_at: DateTime<Utc> = Utc::now();
        let success = results.iter().all(|s| s.success || s.skipped);
        let steps_passed = results.iter().filter(|s| s.success && !s.skipped).count();
        let steps_failed = results.iter().filter(|s| !s.success && !s.skipped).count();
        let total_duration_ms = run_start.elapsed().as_secs_f64() * 1000.0;

        info!(
            workflow = %workflow_name,
            success,
            steps_passed,
            steps_failed,
            duration_ms = total_duration_ms,
            "Workflow execution finished"
        );
        self.emit(
            WORKFLOW_COMPLETED,
            workflow_name,
            event_data(json!({
                "success": success,
                "total_duration_ms": total_duration_ms,
                "steps_passed": steps_passed,
                "steps_failed": steps_failed,
            })),
        )
        .await;

        if let Some(history) = &self.history {
            let record = execution_record(workflow_name, started_at, completed_at, success, &results);
            if let Err(err) = history.record(record).await {
                error!(workflow = %workflow_name, error = %err, "Failed to persist execution history");
            }
        }

        WorkflowResult {
            workflow_name: workflow_name.to_string(),
            steps: results,
        }
    }

    /// Emit `step.completed` for a result, plus the run's single
    /// `failure.detected` when this is the first non-skipped failure.
    async fn emit_step_events(
        &self,
        workflow_name: &str,
        result: &StepResult,
        failure_reported: &mut bool,
    ) {
        self.emit(
            STEP_COMPLETED,
            workflow_name,
            event_data(json!({
                "step_type": result.step_type,
                "service": result.service,
                "success": result.success,
                "duration_ms": result.duration_ms,
            })),
        )
        .await;

        if !result.success && !result.skipped && !*failure_reported {
            *failure_reported = true;
            self.emit(
                FAILURE_DETECTED,
                workflow_name,
                event_data(json!({
                    "step_type": result.step_type,
                    "service": result.service,
                    "error": result.error.as_deref().unwrap_or("Unknown error"),
                })),
            )
            .await;
        }
    }

    /// Evaluate the step's condition, resolve its service and handler,
    /// then execute under retry. Resolution failures yield failing
    /// results with no attempts recorded.
    async fn resolve_and_execute(&self, step: &StepDef, context: &RunContext) -> StepResult {
        if condition::should_skip(step.condition.as_deref(), context.results()) {
            let condition = step.condition.as_deref().unwrap_or_default();
            debug!(step_type = %step.step_type, condition = %condition, "Skipping step");
            return StepResult::skipped(
                &step.step_type,
                &step.service,
                format!("Skipped: condition '{condition}' not met"),
            );
        }

        let Some(entry) = self.services.get(&step.service) else {
            return StepResult::failed(
                &step.step_type,
                &step.service,
                format!("Unknown service: {}", step.service),
            );
        };

        let Some(handler) = self.steps.create(&step.step_type, entry) else {
            return StepResult::failed(
                &step.step_type,
                &step.service,
                format!("Unknown step type: {}", step.step_type),
            );
        };

        self.execute_with_retry(handler.as_ref(), step, context).await
    }

    /// Run one handler under the step's retry and timeout policy.
    ///
    /// The returned result is the final attempt's, carrying its own
    /// wall time in `duration_ms` and the full attempt history.
    async fn execute_with_retry(
        &self,
        handler: &dyn StepHandler,
        step: &StepDef,
        context: &RunContext,
    ) -> StepResult {
        let max_attempts = step.retries + 1;
        let deadline = Duration::from_secs_f64(step.timeout_seconds);
        let mut attempts: Vec<StepAttempt> = Vec::with_capacity(max_attempts as usize);

        for attempt in 1..=max_attempts {
            let attempt_start = Instant::now();
            let mut result = match tokio::time::timeout(deadline, handler.execute(context)).await {
                Ok(result) => result,
                Err(_) => StepResult::failed(
                    &step.step_type,
                    &step.service,
                    format!("Step timed out after {}s", step.timeout_seconds),
                ),
            };
            let duration_ms = attempt_start.elapsed().as_secs_f64() * 1000.0;
            result.duration_ms = Some(duration_ms);

            attempts.push(StepAttempt {
                attempt,
                success: result.success,
                error: result.error.clone(),
                duration_ms,
            });

            if result.success || attempt == max_attempts {
                result.attempts = attempts;
                return result;
            }

            let backoff = step.retry_delay_seconds * f64::powi(2.0, attempt as i32 - 1);
            warn!(
                step_type = %step.step_type,
                service = %step.service,
                attempt,
                backoff_seconds = backoff,
                error = result.error.as_deref().unwrap_or("Unknown error"),
                "Step attempt failed; retrying"
            );
            tokio::time::sleep(Duration::from_secs_f64(backoff)).await;
        }

        unreachable!("retry loop always returns on the final attempt")
    }
}

/// Durable projection of a finished run. `StepRecord.attempts` carries
/// the attempt count, defaulting to 1 when the runner recorded none.
fn execution_record(
    workflow_name: &str,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    success: bool,
    results: &[StepResult],
) -> ExecutionRecord {
    ExecutionRecord {
        workflow_name: workflow_name.to_string(),
        started_at,
        completed_at: Some(completed_at),
        success,
        steps: results
            .iter()
            .map(|s| StepRecord {
                step_type: s.step_type.clone(),
                service: s.service.clone(),
                success: s.success,
                skipped: s.skipped,
                duration_ms: s.duration_ms,
                error: s.error.clone(),
                attempts: s.attempts.len().max(1) as u32,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_events::{EventListener, ListenerResult};
    use aegis_history::{HistoryStore, InMemoryHistory};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Listener capturing every event for assertions.
    #[derive(Default)]
    struct Capture {
        events: Mutex<Vec<WorkflowEvent>>,
    }

    #[async_trait]
    impl EventListener for Capture {
        async fn on_event(&self, event: &WorkflowEvent) -> ListenerResult {
            self.events.lock().push(event.clone());
            Ok(())
        }
    }

    impl Capture {
        fn event_types(&self) -> Vec<String> {
            self.events.lock().iter().map(|e| e.event_type.clone()).collect()
        }
    }

    /// Handler that fails a fixed number of times before succeeding.
    struct FlakyHandler {
        failures_before_success: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl StepHandler for FlakyHandler {
        fn step_type(&self) -> &'static str {
            "flaky"
        }

        async fn execute(&self, _context: &RunContext) -> StepResult {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                StepResult::failed("flaky", "Scripted", "simulated failure")
            } else {
                StepResult::ok("flaky", "Scripted", Map::new())
            }
        }
    }

    /// Handler that sleeps, then succeeds; records start/end marks.
    struct SleepyHandler {
        label: String,
        sleep: Duration,
        marks: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl StepHandler for SleepyHandler {
        fn step_type(&self) -> &'static str {
            "sleepy"
        }

        async fn execute(&self, _context: &RunContext) -> StepResult {
            self.marks.lock().push(format!("start:{}", self.label));
            tokio::time::sleep(self.sleep).await;
            self.marks.lock().push(format!("end:{}", self.label));
            StepResult::ok("sleepy", self.label.clone(), Map::new())
        }
    }

    fn config_from_yaml(yaml: &str) -> AegisConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn qa_workflow_config(base_url: &str, bug_url: &str) -> AegisConfig {
        config_from_yaml(&format!(
            r#"
services:
  qaagent:
    name: QA Agent
    url: {base_url}
  bugalizer:
    name: Bugalizer
    url: {bug_url}
workflows:
  nightly_qa:
    name: Nightly QA
    steps:
      - type: discover
        service: qaagent
      - type: test
        service: qaagent
      - type: submit_bugs
        service: bugalizer
        condition: has_failures
"#
        ))
    }

    fn runner_with_capture(config: AegisConfig) -> (PipelineRunner, Arc<Capture>) {
        let capture = Arc::new(Capture::default());
        let mut emitter = EventEmitter::new();
        emitter.add_listener(capture.clone());
        (PipelineRunner::new(config).with_emitter(emitter), capture)
    }

    #[tokio::test]
    async fn test_happy_path_with_conditional_skip() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/routes")
            .with_status(200)
            .with_body(r#"{"routes": ["/login"]}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/api/runs")
            .with_status(200)
            .with_body(r#"{"total": 2, "passed": 2, "failed": 0, "failures": []}"#)
            .create_async()
            .await;

        let (runner, capture) =
            runner_with_capture(qa_workflow_config(&server.url(), "http://127.0.0.1:1"));
        let result = runner.run("nightly_qa").await;

        assert_eq!(result.steps.len(), 3);
        assert!(result.success());
        assert!(result.steps[2].skipped);
        assert_eq!(
            result.steps[2].data["message"],
            "Skipped: condition 'has_failures' not met"
        );

        assert_eq!(
            capture.event_types(),
            vec![
                WORKFLOW_STARTED,
                STEP_COMPLETED,
                STEP_COMPLETED,
                STEP_COMPLETED,
                WORKFLOW_COMPLETED,
            ]
        );

        let events = capture.events.lock();
        assert_eq!(events[0].data["step_count"], 3);
        assert_eq!(events[4].data["success"], true);
        assert_eq!(events[4].data["steps_passed"], 2);
        assert_eq!(events[4].data["steps_failed"], 0);
    }

    #[tokio::test]
    async fn test_failures_route_to_submit() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/routes")
            .with_status(200)
            .with_body(r#"{"routes": []}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/api/runs")
            .with_status(200)
            .with_body(r#"{"total": 2, "passed": 0, "failed": 2, "failures": [{"t": "a"}, {"t": "b"}]}"#)
            .create_async()
            .await;
        let report_mock = server
            .mock("POST", "/api/v1/reports")
            .with_status(200)
            .with_body(r#"{"created": 2}"#)
            .create_async()
            .await;

        let (runner, _capture) = runner_with_capture(qa_workflow_config(&server.url(), &server.url()));
        let result = runner.run("nightly_qa").await;

        assert!(result.success());
        assert!(!result.steps[2].skipped);
        assert_eq!(result.steps[2].data["submitted"], 2);
        report_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_retry_succeeds_on_third_attempt() {
        let config = config_from_yaml(
            r#"
services:
  scripted:
    name: Scripted
    url: http://127.0.0.1:1
workflows:
  retry_wf:
    name: Retry
    steps:
      - type: flaky
        service: scripted
        retries: 2
        retry_delay_seconds: 0.01
"#,
        );

        let mut steps = StepRegistry::empty();
        steps.register("flaky", |_entry| {
            Arc::new(FlakyHandler {
                failures_before_success: 2,
                calls: AtomicU32::new(0),
            })
        });

        let runner = PipelineRunner::new(config).with_step_registry(steps);
        let started = Instant::now();
        let result = runner.run("retry_wf").await;
        let elapsed = started.elapsed();

        let step = &result.steps[0];
        assert!(step.success);
        assert_eq!(step.attempts.len(), 3);
        assert!(!step.attempts[0].success);
        assert!(!step.attempts[1].success);
        assert!(step.attempts[2].success);
        assert_eq!(step.attempts[2].success, step.success);
        // Backoff: 10ms after the first failure, 20ms after the second.
        assert!(elapsed >= Duration::from_millis(30), "elapsed: {elapsed:?}");
    }

    #[tokio::test]
    async fn test_step_timeout_synthesizes_failure() {
        let config = config_from_yaml(
            r#"
services:
  scripted:
    name: Scripted
    url: http://127.0.0.1:1
workflows:
  slow_wf:
    name: Slow
    steps:
      - type: sleepy
        service: scripted
        timeout_seconds: 0.05
"#,
        );

        let marks = Arc::new(Mutex::new(Vec::new()));
        let mut steps = StepRegistry::empty();
        let marks_for_factory = marks.clone();
        steps.register("sleepy", move |_entry| {
            Arc::new(SleepyHandler {
                label: "slow".to_string(),
                sleep: Duration::from_secs(1),
                marks: marks_for_factory.clone(),
            })
        });

        let runner = PipelineRunner::new(config).with_step_registry(steps);
        let result = runner.run("slow_wf").await;

        let step = &result.steps[0];
        assert!(!step.success);
        assert!(step.error.as_deref().unwrap().contains("timed out"));
        assert!(step.duration_ms.unwrap() >= 50.0);
        assert_eq!(step.attempts.len(), 1);
        assert!(!result.success());
    }

    #[tokio::test]
    async fn test_parallel_batch_overlaps() {
        let config = config_from_yaml(
            r#"
services:
  scripted:
    name: Scripted
    url: http://127.0.0.1:1
workflows:
  par_wf:
    name: Parallel
    steps:
      - type: sleep_a
        service: scripted
        parallel: true
      - type: sleep_b
        service: scripted
        parallel: true
"#,
        );

        let marks = Arc::new(Mutex::new(Vec::new()));
        let mut steps = StepRegistry::empty();
        for label in ["a", "b"] {
            let marks = marks.clone();
            let label = label.to_string();
            steps.register(format!("sleep_{label}"), move |_entry| {
                Arc::new(SleepyHandler {
                    label: label.clone(),
                    sleep: Duration::from_millis(50),
                    marks: marks.clone(),
                })
            });
        }

        let runner = PipelineRunner::new(config).with_step_registry(steps);
        let started = Instant::now();
        let result = runner.run("par_wf").await;
        let elapsed = started.elapsed();

        assert!(result.success());
        assert_eq!(result.steps.len(), 2);
        assert!(elapsed < Duration::from_millis(90), "elapsed: {elapsed:?}");
    }

    #[tokio::test]
    async fn test_sequential_step_waits_for_parallel_batch() {
        let config = config_from_yaml(
            r#"
services:
  scripted:
    name: Scripted
    url: http://127.0.0.1:1
workflows:
  mixed_wf:
    name: Mixed
    steps:
      - type: sleep_a
        service: scripted
        parallel: true
      - type: sleep_b
        service: scripted
        parallel: true
      - type: sleep_final
        service: scripted
"#,
        );

        let marks = Arc::new(Mutex::new(Vec::new()));
        let mut steps = StepRegistry::empty();
        for (tag, label, sleep_ms) in [
            ("sleep_a", "a", 50),
            ("sleep_b", "b", 30),
            ("sleep_final", "final", 1),
        ] {
            let marks = marks.clone();
            let label = label.to_string();
            steps.register(tag, move |_entry| {
                Arc::new(SleepyHandler {
                    label: label.clone(),
                    sleep: Duration::from_millis(sleep_ms),
                    marks: marks.clone(),
                })
            });
        }

        let runner = PipelineRunner::new(config).with_step_registry(steps);
        let result = runner.run("mixed_wf").await;

        assert!(result.success());
        // Declaration order preserved in the result.
        assert_eq!(result.steps[0].service, "a");
        assert_eq!(result.steps[1].service, "b");
        assert_eq!(result.steps[2].service, "final");

        // The sequential step starts only after both peers finished.
        let marks = marks.lock();
        let position = |m: &str| marks.iter().position(|x| x == m).unwrap();
        assert!(position("start:final") > position("end:a"));
        assert!(position("start:final") > position("end:b"));
    }

    #[tokio::test]
    async fn test_unknown_workflow_yields_synthetic_result() {
        let runner = PipelineRunner::new(AegisConfig::default());
        let result = runner.run("ghost").await;

        assert_eq!(result.steps.len(), 1);
        let step = &result.steps[0];
        assert_eq!(step.step_type, "error");
        assert_eq!(step.service, "aegis");
        assert!(!step.success);
        assert_eq!(step.error.as_deref(), Some("Unknown workflow: ghost"));
        assert!(step.attempts.is_empty());
        assert!(!result.success());
    }

    #[tokio::test]
    async fn test_unknown_service_and_step_type() {
        let config = config_from_yaml(
            r#"
services:
  qaagent:
    name: QA Agent
    url: http://127.0.0.1:1
workflows:
  broken_wf:
    name: Broken
    steps:
      - type: discover
        service: missing
      - type: teleport
        service: qaagent
"#,
        );

        let runner = PipelineRunner::new(config);
        let result = runner.run("broken_wf").await;

        assert_eq!(
            result.steps[0].error.as_deref(),
            Some("Unknown service: missing")
        );
        assert!(result.steps[0].attempts.is_empty());
        assert_eq!(
            result.steps[1].error.as_deref(),
            Some("Unknown step type: teleport")
        );
        assert!(result.steps[1].attempts.is_empty());
    }

    #[tokio::test]
    async fn test_single_failure_detected_per_run() {
        let config = config_from_yaml(
            r#"
services:
  scripted:
    name: Scripted
    url: http://127.0.0.1:1
workflows:
  failing_wf:
    name: Failing
    steps:
      - type: flaky
        service: scripted
      - type: flaky
        service: scripted
"#,
        );

        let mut steps = StepRegistry::empty();
        steps.register("flaky", |_entry| {
            Arc::new(FlakyHandler {
                failures_before_success: u32::MAX,
                calls: AtomicU32::new(0),
            })
        });

        let capture = Arc::new(Capture::default());
        let mut emitter = EventEmitter::new();
        emitter.add_listener(capture.clone());
        let runner = PipelineRunner::new(config)
            .with_step_registry(steps)
            .with_emitter(emitter);

        let result = runner.run("failing_wf").await;
        assert!(!result.success());

        let types = capture.event_types();
        assert_eq!(
            types.iter().filter(|t| *t == FAILURE_DETECTED).count(),
            1
        );
        // The failure event immediately follows the first failing step.
        assert_eq!(types[1], STEP_COMPLETED);
        assert_eq!(types[2], FAILURE_DETECTED);

        let events = capture.events.lock();
        let failure = events.iter().find(|e| e.event_type == FAILURE_DETECTED).unwrap();
        assert_eq!(failure.data["error"], "simulated failure");
    }

    #[tokio::test]
    async fn test_history_records_attempt_counts() {
        let config = config_from_yaml(
            r#"
services:
  scripted:
    name: Scripted
    url: http://127.0.0.1:1
workflows:
  hist_wf:
    name: Hist
    steps:
      - type: flaky
        service: scripted
        retries: 1
        retry_delay_seconds: 0.01
      - type: flaky2
        service: scripted
        condition: on_failure
"#,
        );

        let mut steps = StepRegistry::empty();
        steps.register("flaky", |_entry| {
            Arc::new(FlakyHandler {
                failures_before_success: 1,
                calls: AtomicU32::new(0),
            })
        });
        steps.register("flaky2", |_entry| {
            Arc::new(FlakyHandler {
                failures_before_success: 0,
                calls: AtomicU32::new(0),
            })
        });

        let history = Arc::new(InMemoryHistory::new());
        let runner = PipelineRunner::new(config)
            .with_step_registry(steps)
            .with_history(history.clone());

        let result = runner.run("hist_wf").await;
        assert!(result.success());
        // Second step skipped: nothing failed so far.
        assert!(result.steps[1].skipped);

        let records = history.get_history("hist_wf").await.unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert!(record.success);
        assert!(record.completed_at.is_some());
        assert_eq!(record.steps.len(), 2);
        assert_eq!(record.steps[0].attempts, 2);
        // Skipped step has no recorded attempts; the count defaults to 1.
        assert_eq!(record.steps[1].attempts, 1);
        assert!(record.steps[1].skipped);
    }

    #[tokio::test]
    async fn test_parallel_peers_do_not_see_each_other() {
        // Both parallel steps carry `on_failure`; with an empty context
        // snapshot the condition is vacuously met, so both skip, even
        // though each would observe the other's result if appended
        // eagerly.
        let config = config_from_yaml(
            r#"
services:
  scripted:
    name: Scripted
    url: http://127.0.0.1:1
workflows:
  peers_wf:
    name: Peers
    steps:
      - type: flaky
        service: scripted
        condition: on_failure
        parallel: true
      - type: flaky
        service: scripted
        condition: on_failure
        parallel: true
"#,
        );

        let mut steps = StepRegistry::empty();
        steps.register("flaky", |_entry| {
            Arc::new(FlakyHandler {
                failures_before_success: u32::MAX,
                calls: AtomicU32::new(0),
            })
        });

        let runner = PipelineRunner::new(config).with_step_registry(steps);
        let result = runner.run("peers_wf").await;

        assert!(result.steps[0].skipped);
        assert!(result.steps[1].skipped);
        assert!(result.success());
    }
}
