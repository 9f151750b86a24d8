//! Sqlite-backed history with retention pruning.
//!
//! Two tables: `workflow_runs` and `step_runs`, the latter holding a
//! cascading foreign key onto its run. Each `record` call is one
//! transaction: insert run, insert steps, prune excess runs, commit.
//! Timestamps are stored as ISO-8601 UTC strings.

use crate::models::{ExecutionRecord, StepRecord};
use crate::store::{HistoryError, HistoryStore, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use tracing::debug;

const CREATE_RUNS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS workflow_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    workflow_name TEXT NOT NULL,
    started_at TEXT NOT NULL,
    completed_at TEXT,
    success INTEGER NOT NULL DEFAULT 0
)
"#;

const CREATE_STEPS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS step_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES workflow_runs(id) ON DELETE CASCADE,
    step_type TEXT NOT NULL,
    service TEXT NOT NULL,
    success INTEGER NOT NULL DEFAULT 0,
    skipped INTEGER NOT NULL DEFAULT 0,
    duration_ms REAL,
    error TEXT,
    attempts INTEGER NOT NULL DEFAULT 1
)
"#;

/// Sqlite-backed execution history with optional retention pruning.
///
/// `max_records = 0` disables pruning; otherwise only the newest
/// `max_records` runs per workflow survive a `record` call, with their
/// step rows removed by foreign-key cascade.
pub struct SqliteHistory {
    pool: SqlitePool,
    max_records: u32,
}

impl SqliteHistory {
    /// Open (creating if missing) the database at `path`.
    pub async fn connect(path: impl AsRef<Path>, max_records: u32) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        // Writers serialize on a single connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_RUNS_TABLE).execute(&pool).await?;
        sqlx::query(CREATE_STEPS_TABLE).execute(&pool).await?;

        Ok(Self { pool, max_records })
    }

    fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| HistoryError::InvalidTimestamp(value.to_string()))
    }

    fn run_from_row(row: &SqliteRow) -> Result<(i64, ExecutionRecord)> {
        let id: i64 = row.get("id");
        let started_at: String = row.get("started_at");
        let completed_at: Option<String> = row.get("completed_at");

        let completed_at = completed_at
            .as_deref()
            .map(Self::parse_timestamp)
            .transpose()?;

        Ok((
            id,
            ExecutionRecord {
                workflow_name: row.get("workflow_name"),
                started_at: Self::parse_timestamp(&started_at)?,
                completed_at,
                success: row.get("success"),
                steps: Vec::new(),
            },
        ))
    }

    async fn load_steps(&self, run_id: i64) -> Result<Vec<StepRecord>> {
        let rows = sqlx::query(
            "SELECT step_type, service, success, skipped, duration_ms, error, attempts
             FROM step_runs WHERE run_id = ?1 ORDER BY id",
        )
        .bind(run_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| StepRecord {
                step_type: row.get("step_type"),
                service: row.get("service"),
                success: row.get("success"),
                skipped: row.get("skipped"),
                duration_ms: row.get("duration_ms"),
                error: row.get("error"),
                attempts: row.get::<i64, _>("attempts") as u32,
            })
            .collect())
    }

    async fn rows_to_records(&self, rows: Vec<SqliteRow>) -> Result<Vec<ExecutionRecord>> {
        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let (id, mut record) = Self::run_from_row(row)?;
            record.steps = self.load_steps(id).await?;
            records.push(record);
        }
        Ok(records)
    }
}

#[async_trait]
impl HistoryStore for SqliteHistory {
    async fn record(&self, execution: ExecutionRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let run_id = sqlx::query(
            "INSERT INTO workflow_runs (workflow_name, started_at, completed_at, success)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&execution.workflow_name)
        .bind(execution.started_at.to_rfc3339())
        .bind(execution.completed_at.map(|t| t.to_rfc3339()))
        .bind(execution.success)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for step in &execution.steps {
            sqlx::query(
                "INSERT INTO step_runs (run_id, step_type, service, success, skipped, duration_ms, error, attempts)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(run_id)
            .bind(&step.step_type)
            .bind(&step.service)
            .bind(step.success)
            .bind(step.skipped)
            .bind(step.duration_ms)
            .bind(&step.error)
            .bind(step.attempts as i64)
            .execute(&mut *tx)
            .await?;
        }

        if self.max_records > 0 {
            let count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM workflow_runs WHERE workflow_name = ?1")
                    .bind(&execution.workflow_name)
                    .fetch_one(&mut *tx)
                    .await?;

            let excess = count - i64::from(self.max_records);
            if excess > 0 {
                // Child step rows go with the runs via cascade.
                sqlx::query(
                    "DELETE FROM workflow_runs WHERE id IN (
                         SELECT id FROM workflow_runs WHERE workflow_name = ?1
                         ORDER BY started_at ASC LIMIT ?2
                     )",
                )
                .bind(&execution.workflow_name)
                .bind(excess)
                .execute(&mut *tx)
                .await?;

                debug!(
                    workflow = %execution.workflow_name,
                    pruned = excess,
                    "Pruned excess history records"
                );
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_history(&self, workflow_name: &str) -> Result<Vec<ExecutionRecord>> {
        let rows = sqlx::query(
            "SELECT id, workflow_name, started_at, completed_at, success
             FROM workflow_runs WHERE workflow_name = ?1 ORDER BY started_at DESC",
        )
        .bind(workflow_name)
        .fetch_all(&self.pool)
        .await?;

        self.rows_to_records(rows).await
    }

    async fn get_all(&self) -> Result<std::collections::HashMap<String, Vec<ExecutionRecord>>> {
        let rows = sqlx::query(
            "SELECT id, workflow_name, started_at, completed_at, success
             FROM workflow_runs ORDER BY started_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: std::collections::HashMap<String, Vec<ExecutionRecord>> =
            std::collections::HashMap::new();
        for record in self.rows_to_records(rows).await? {
            grouped
                .entry(record.workflow_name.clone())
                .or_default()
                .push(record);
        }
        Ok(grouped)
    }

    async fn get_recent(&self, limit: usize) -> Result<Vec<ExecutionRecord>> {
        let rows = sqlx::query(
            "SELECT id, workflow_name, started_at, completed_at, success
             FROM workflow_runs ORDER BY started_at DESC LIMIT ?1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        self.rows_to_records(rows).await
    }
}
