//! Shared application state.
//!
//! Passed to all handlers via Axum's state management.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::engine::{ExecutionStore, WorkflowEngine};
use crate::services::WorkflowService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DbPool,

    /// Application configuration
    pub config: Arc<AppConfig>,

    /// The workflow engine
    pub engine: WorkflowEngine,

    /// Workflow definition service
    pub workflows: WorkflowService,

    /// Execution audit store (read side for the API)
    pub store: Arc<dyn ExecutionStore>,

    /// Server start time for uptime calculation
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(
        db: DbPool,
        config: AppConfig,
        engine: WorkflowEngine,
        workflows: WorkflowService,
        store: Arc<dyn ExecutionStore>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            engine,
            workflows,
            store,
            start_time: std::time::Instant::now(),
        }
    }

    /// Get the server uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
