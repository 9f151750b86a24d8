//! In-memory history backend.

use crate::models::ExecutionRecord;
use crate::store::{HistoryStore, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Mutex-guarded map of workflow name to insertion-ordered records.
#[derive(Default)]
pub struct InMemoryHistory {
    records: Mutex<HashMap<String, Vec<ExecutionRecord>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistory {
    async fn record(&self, execution: ExecutionRecord) -> Result<()> {
        let mut records = self.records.lock();
        records
            .entry(execution.workflow_name.clone())
            .or_default()
            .push(execution);
        Ok(())
    }

    async fn get_history(&self, workflow_name: &str) -> Result<Vec<ExecutionRecord>> {
        let records = self.records.lock();
        Ok(records
            .get(workflow_name)
            .map(|list| list.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_all(&self) -> Result<HashMap<String, Vec<ExecutionRecord>>> {
        let records = self.records.lock();
        Ok(records
            .iter()
            .map(|(name, list)| (name.clone(), list.iter().rev().cloned().collect()))
            .collect())
    }

    async fn get_recent(&self, limit: usize) -> Result<Vec<ExecutionRecord>> {
        let records = self.records.lock();
        let mut all: Vec<ExecutionRecord> = records.values().flatten().cloned().collect();
        all.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        all.truncate(limit);
        Ok(all)
    }
}
