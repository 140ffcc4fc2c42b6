//! Workflow definition service.
//!
//! Owns the workflow CRUD surface and serves as the engine's registry of
//! active definitions. Activation is the only gate: a workflow must carry at
//! least one action before it can be activated.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::models::{TriggerType, Workflow, WorkflowAction, WorkflowStatus};
use crate::db::queries::workflow as queries;
use crate::db::DbPool;
use crate::engine::registry::{WorkflowRegistry, WorkflowSnapshot};
use crate::error::{AppError, AppResult};

/// Request body for creating a workflow.
#[derive(Debug, Deserialize)]
pub struct CreateWorkflowRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub trigger_type: String,
    #[serde(default)]
    pub trigger_config: Option<serde_json::Value>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub actions: Vec<ActionInput>,
}

/// One action in a create or replace request. Positions are assigned from
/// list order; `delay_minutes` is accepted from legacy clients and converted.
#[derive(Debug, Deserialize)]
pub struct ActionInput {
    pub kind: String,
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default)]
    pub condition: Option<serde_json::Value>,
    #[serde(default)]
    pub delay_seconds: Option<i64>,
    #[serde(default)]
    pub delay_minutes: Option<i64>,
}

impl ActionInput {
    fn delay_seconds(&self) -> AppResult<Option<i64>> {
        let delay = match (self.delay_seconds, self.delay_minutes) {
            (Some(secs), _) => Some(secs),
            (None, Some(mins)) => Some(mins * 60),
            (None, None) => None,
        };
        if let Some(d) = delay {
            if d < 0 {
                return Err(AppError::Validation(
                    "Action delay must not be negative".to_string(),
                ));
            }
        }
        Ok(delay)
    }
}

/// A workflow definition with its ordered actions.
#[derive(Debug, Clone, serde::Serialize)]
pub struct WorkflowDetail {
    #[serde(flatten)]
    pub workflow: Workflow,
    pub actions: Vec<WorkflowAction>,
}

/// Map loose operator-facing trigger names onto the canonical set.
fn canonical_trigger(name: &str) -> String {
    let normalized = name.trim().to_lowercase();
    match normalized.as_str() {
        "new_member" | "member_joined" => "member_created".to_string(),
        "member_update" => "member_updated".to_string(),
        "donation" | "new_donation" => "donation_received".to_string(),
        "event_registration" => "event_registered".to_string(),
        "missed_attendance" => "attendance_missed".to_string(),
        _ => normalized,
    }
}

/// Service for workflow definition operations.
#[derive(Clone)]
pub struct WorkflowService {
    pool: DbPool,
}

impl WorkflowService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a workflow in `draft` state with its action list.
    pub async fn create(&self, request: CreateWorkflowRequest) -> AppResult<WorkflowDetail> {
        if request.name.trim().is_empty() {
            return Err(AppError::Validation(
                "Workflow name must not be empty".to_string(),
            ));
        }
        if request.trigger_type.trim().is_empty() {
            return Err(AppError::Validation(
                "Workflow trigger_type must not be empty".to_string(),
            ));
        }

        let workflow = Workflow {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            description: request.description,
            trigger_type: canonical_trigger(&request.trigger_type),
            trigger_config: request.trigger_config,
            status: WorkflowStatus::Draft.to_string(),
            author_id: request.author_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let actions = build_actions(workflow.id, &request.actions)?;

        queries::insert_workflow(&self.pool, &workflow).await?;
        queries::replace_actions(&self.pool, workflow.id, &actions).await?;

        tracing::info!(
            workflow_id = %workflow.id,
            name = %workflow.name,
            trigger = %workflow.trigger_type,
            actions = actions.len(),
            "Workflow created"
        );

        Ok(WorkflowDetail { workflow, actions })
    }

    /// Get a workflow with its actions.
    pub async fn get(&self, id: Uuid) -> AppResult<WorkflowDetail> {
        let workflow = queries::get_workflow(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Workflow not found: {}", id)))?;
        let actions = queries::actions_for_workflow(&self.pool, id).await?;
        Ok(WorkflowDetail { workflow, actions })
    }

    /// List workflows, optionally filtered by status.
    pub async fn list(&self, status: Option<&str>) -> AppResult<Vec<Workflow>> {
        queries::list_workflows(&self.pool, status).await
    }

    /// Transition a workflow between `draft`, `active` and `paused`.
    /// Activation requires at least one action.
    pub async fn set_status(&self, id: Uuid, status: WorkflowStatus) -> AppResult<WorkflowDetail> {
        if status == WorkflowStatus::Active {
            let actions = queries::count_actions(&self.pool, id).await?;
            if actions == 0 {
                return Err(AppError::Validation(
                    "Cannot activate a workflow with no actions".to_string(),
                ));
            }
        }

        let rows = queries::set_workflow_status(&self.pool, id, &status.to_string()).await?;
        if rows == 0 {
            return Err(AppError::NotFound(format!("Workflow not found: {}", id)));
        }

        tracing::info!(workflow_id = %id, status = %status, "Workflow status changed");
        self.get(id).await
    }

    /// Replace a workflow's action list wholesale. Positions are reassigned
    /// densely from list order.
    pub async fn replace_actions(
        &self,
        id: Uuid,
        inputs: &[ActionInput],
    ) -> AppResult<WorkflowDetail> {
        let workflow = queries::get_workflow(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Workflow not found: {}", id)))?;

        if workflow.is_active() && inputs.is_empty() {
            return Err(AppError::Validation(
                "Cannot remove every action from an active workflow".to_string(),
            ));
        }

        let actions = build_actions(id, inputs)?;
        queries::replace_actions(&self.pool, id, &actions).await?;

        tracing::info!(workflow_id = %id, actions = actions.len(), "Workflow actions replaced");
        Ok(WorkflowDetail { workflow, actions })
    }

    /// Delete a workflow; actions and executions cascade.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let rows = queries::delete_workflow(&self.pool, id).await?;
        if rows == 0 {
            return Err(AppError::NotFound(format!("Workflow not found: {}", id)));
        }
        tracing::info!(workflow_id = %id, "Workflow deleted");
        Ok(())
    }
}

fn build_actions(workflow_id: Uuid, inputs: &[ActionInput]) -> AppResult<Vec<WorkflowAction>> {
    inputs
        .iter()
        .enumerate()
        .map(|(position, input)| {
            if input.kind.trim().is_empty() {
                return Err(AppError::Validation(
                    "Action kind must not be empty".to_string(),
                ));
            }
            Ok(WorkflowAction {
                id: Uuid::new_v4(),
                workflow_id,
                kind: input.kind.trim().to_lowercase(),
                position: position as i32,
                config: input.config.clone(),
                condition: input.condition.clone(),
                delay_seconds: input.delay_seconds()?,
            })
        })
        .collect()
}

#[async_trait]
impl WorkflowRegistry for WorkflowService {
    async fn active_for_trigger(&self, trigger: &TriggerType) -> AppResult<Vec<WorkflowSnapshot>> {
        let workflows =
            queries::active_workflows_for_trigger(&self.pool, &trigger.to_string()).await?;

        let mut snapshots = Vec::with_capacity(workflows.len());
        for workflow in workflows {
            let actions = queries::actions_for_workflow(&self.pool, workflow.id).await?;
            snapshots.push(WorkflowSnapshot { workflow, actions });
        }
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_trigger_aliases() {
        assert_eq!(canonical_trigger("new_member"), "member_created");
        assert_eq!(canonical_trigger("Donation"), "donation_received");
        assert_eq!(canonical_trigger("missed_attendance"), "attendance_missed");
        assert_eq!(canonical_trigger("member_created"), "member_created");
        assert_eq!(canonical_trigger("birthday"), "birthday");
    }

    #[test]
    fn test_action_input_delay_units() {
        let input: ActionInput =
            serde_json::from_value(json!({"kind": "send_email", "delay_minutes": 10})).unwrap();
        assert_eq!(input.delay_seconds().unwrap(), Some(600));

        let input: ActionInput = serde_json::from_value(
            json!({"kind": "send_email", "delay_seconds": 90, "delay_minutes": 10}),
        )
        .unwrap();
        assert_eq!(input.delay_seconds().unwrap(), Some(90));

        let input: ActionInput =
            serde_json::from_value(json!({"kind": "send_email", "delay_minutes": -1})).unwrap();
        assert!(input.delay_seconds().is_err());
    }

    #[test]
    fn test_build_actions_assigns_dense_positions() {
        let workflow_id = Uuid::new_v4();
        let inputs: Vec<ActionInput> = serde_json::from_value(json!([
            {"kind": "send_email", "config": {"subject": "s", "body": "b"}},
            {"kind": "SEND_SMS", "config": {"body": "b"}}
        ]))
        .unwrap();

        let actions = build_actions(workflow_id, &inputs).unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].position, 0);
        assert_eq!(actions[1].position, 1);
        assert_eq!(actions[1].kind, "send_sms");
    }

    #[test]
    fn test_build_actions_rejects_empty_kind() {
        let inputs: Vec<ActionInput> =
            serde_json::from_value(json!([{"kind": "  "}])).unwrap();
        assert!(build_actions(Uuid::new_v4(), &inputs).is_err());
    }
}
