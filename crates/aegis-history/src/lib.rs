//! Execution history backends for the Aegis workflow engine.
//!
//! Two interchangeable [`HistoryStore`] implementations: an in-memory
//! map for tests and ephemeral deployments, and a sqlite-backed store
//! with per-workflow retention pruning that survives process restarts.

pub mod memory;
pub mod models;
pub mod sqlite;
pub mod store;

pub use memory::InMemoryHistory;
pub use models::{ExecutionRecord, StepRecord};
pub use sqlite::SqliteHistory;
pub use store::{HistoryError, HistoryStore, HistoryStoreRef, Result};
