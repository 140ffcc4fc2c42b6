//! Execution audit API handlers.
//!
//! Read-only views over the audit trail; the engine is the only writer.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{ActionExecution, Execution};
use crate::error::AppError;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

/// Query parameters for execution listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListExecutionsQuery {
    pub limit: Option<i64>,
}

impl ListExecutionsQuery {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// An execution with its per-action audit rows.
#[derive(Debug, Serialize)]
pub struct ExecutionDetail {
    #[serde(flatten)]
    pub execution: Execution,
    pub actions: Vec<ActionExecution>,
}

/// Most recent executions across all workflows.
///
/// `GET /api/executions?limit=50`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListExecutionsQuery>,
) -> Result<Json<Vec<Execution>>, AppError> {
    let executions = state.store.recent_executions(query.limit()).await?;
    Ok(Json(executions))
}

/// One execution with its action rows.
///
/// `GET /api/executions/{id}`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExecutionDetail>, AppError> {
    let execution = state
        .store
        .get_execution(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Execution not found: {}", id)))?;
    let actions = state.store.action_executions(id).await?;

    Ok(Json(ExecutionDetail { execution, actions }))
}

/// Executions for one workflow, most recent first.
///
/// `GET /api/workflows/{id}/executions?limit=50`
pub async fn list_for_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListExecutionsQuery>,
) -> Result<Json<Vec<Execution>>, AppError> {
    let executions = state
        .store
        .executions_for_workflow(id, query.limit())
        .await?;
    Ok(Json(executions))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_and_clamps() {
        assert_eq!(ListExecutionsQuery::default().limit(), DEFAULT_LIMIT);
        assert_eq!(ListExecutionsQuery { limit: Some(0) }.limit(), 1);
        assert_eq!(ListExecutionsQuery { limit: Some(10_000) }.limit(), MAX_LIMIT);
    }
}
