//! Event ingestion handlers.
//!
//! Event producers post domain events here; the engine starts one execution
//! per matched workflow and the handler responds as soon as the executions
//! are started, never waiting for delays or action outcomes.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::TriggerType;
use crate::engine::TriggerEvent;
use crate::error::AppError;
use crate::state::AppState;

/// Response for accepted events.
#[derive(Debug, Serialize, Deserialize)]
pub struct EventAccepted {
    pub status: String,
    /// Executions started for this event.
    pub executions: Vec<Uuid>,
}

/// Request body for an operator-initiated manual trigger.
#[derive(Debug, Deserialize)]
pub struct ManualTriggerRequest {
    pub trigger_type: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Ingest a domain event.
///
/// `POST /api/events`
///
/// - `202 Accepted` with the started execution ids
pub async fn ingest_event(
    State(state): State<AppState>,
    Json(event): Json<TriggerEvent>,
) -> Result<(StatusCode, Json<EventAccepted>), AppError> {
    let executions = state.engine.execute_workflows(&event).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(EventAccepted {
            status: "accepted".to_string(),
            executions,
        }),
    ))
}

/// Fire workflows from a synthetic operator event.
///
/// `POST /api/workflows/execute`
///
/// Same matching and execution contract as event ingestion; the event simply
/// originates from an operator instead of a producer subsystem.
pub async fn manual_trigger(
    State(state): State<AppState>,
    Json(request): Json<ManualTriggerRequest>,
) -> Result<(StatusCode, Json<EventAccepted>), AppError> {
    if request.trigger_type.trim().is_empty() {
        return Err(AppError::Validation(
            "trigger_type must not be empty".to_string(),
        ));
    }

    let event = TriggerEvent::new(
        TriggerType::from(request.trigger_type.trim()),
        request.payload,
    );
    let executions = state.engine.execute_workflows(&event).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(EventAccepted {
            status: "accepted".to_string(),
            executions,
        }),
    ))
}
