//! Workflow definition API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::models::{Workflow, WorkflowStatus};
use crate::error::AppError;
use crate::services::workflow::{ActionInput, CreateWorkflowRequest, WorkflowDetail};
use crate::state::AppState;

/// Query parameters for listing workflows.
#[derive(Debug, Default, Deserialize)]
pub struct ListWorkflowsQuery {
    pub status: Option<String>,
}

/// Request body for a status transition.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: WorkflowStatus,
}

/// Create a workflow.
///
/// `POST /api/workflows`
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateWorkflowRequest>,
) -> Result<(StatusCode, Json<WorkflowDetail>), AppError> {
    let detail = state.workflows.create(request).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// List workflows.
///
/// `GET /api/workflows?status=active`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListWorkflowsQuery>,
) -> Result<Json<Vec<Workflow>>, AppError> {
    let workflows = state.workflows.list(query.status.as_deref()).await?;
    Ok(Json(workflows))
}

/// Get a workflow with its actions.
///
/// `GET /api/workflows/{id}`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowDetail>, AppError> {
    let detail = state.workflows.get(id).await?;
    Ok(Json(detail))
}

/// Transition a workflow between draft, active and paused.
///
/// `POST /api/workflows/{id}/status`
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetStatusRequest>,
) -> Result<Json<WorkflowDetail>, AppError> {
    let detail = state.workflows.set_status(id, request.status).await?;
    Ok(Json(detail))
}

/// Replace a workflow's action list wholesale.
///
/// `PUT /api/workflows/{id}/actions`
pub async fn replace_actions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(actions): Json<Vec<ActionInput>>,
) -> Result<Json<WorkflowDetail>, AppError> {
    let detail = state.workflows.replace_actions(id, &actions).await?;
    Ok(Json(detail))
}

/// Delete a workflow.
///
/// `DELETE /api/workflows/{id}`
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.workflows.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
