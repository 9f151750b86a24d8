//! The execution history contract.

use crate::models::ExecutionRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Error type for history store operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored timestamp failed to parse
    #[error("Invalid stored timestamp: {0}")]
    InvalidTimestamp(String),
}

pub type Result<T> = std::result::Result<T, HistoryError>;

/// Append-only storage of execution records with retention pruning.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append an execution record.
    async fn record(&self, execution: ExecutionRecord) -> Result<()>;

    /// Records for one workflow, most recent first.
    async fn get_history(&self, workflow_name: &str) -> Result<Vec<ExecutionRecord>>;

    /// All records grouped by workflow, most recent first within each group.
    async fn get_all(&self) -> Result<HashMap<String, Vec<ExecutionRecord>>>;

    /// The most recent records across all workflows.
    async fn get_recent(&self, limit: usize) -> Result<Vec<ExecutionRecord>>;
}

/// Type alias for Arc-wrapped HistoryStore.
pub type HistoryStoreRef = Arc<dyn HistoryStore>;
