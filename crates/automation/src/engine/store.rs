//! Execution store contract.
//!
//! The durable audit trail: one execution row per (workflow, event) run and
//! one action-execution row per action evaluated. Writes touch only the
//! execution's own rows; concurrent executions never contend beyond
//! row-level identity.

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::db::models::{ActionExecution, ActionStatus, Execution, ExecutionStatus, Workflow,
    WorkflowAction};
use crate::engine::event::TriggerEvent;
use crate::engine::executor::ActionResult;
use crate::error::{AppError, AppResult};

/// Durable record of executions and per-action outcomes.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Open an execution row (status `running`) with the event snapshot
    /// attached. Returns the new execution id, or `AppError::Conflict` when
    /// an execution for this (workflow, idempotency key) already exists.
    async fn create_execution(&self, workflow: &Workflow, event: &TriggerEvent)
        -> AppResult<Uuid>;

    /// Find an existing execution for (workflow, idempotency key).
    async fn find_by_idempotency(
        &self,
        workflow_id: Uuid,
        key: &str,
    ) -> AppResult<Option<Uuid>>;

    /// Record an action entering `running`. Returns the action-execution id.
    async fn record_action_start(
        &self,
        execution_id: Uuid,
        action: &WorkflowAction,
    ) -> AppResult<Uuid>;

    /// Record an action that will not run (`skipped_condition_false` or
    /// `skipped`).
    async fn record_action_skipped(
        &self,
        execution_id: Uuid,
        action: &WorkflowAction,
        status: ActionStatus,
    ) -> AppResult<Uuid>;

    /// Record the outcome of a previously started action.
    async fn record_action_outcome(
        &self,
        action_execution_id: Uuid,
        result: &ActionResult,
    ) -> AppResult<()>;

    /// Close an execution with its terminal status.
    async fn record_execution_end(
        &self,
        execution_id: Uuid,
        status: ExecutionStatus,
        error: Option<String>,
    ) -> AppResult<()>;

    /// Executions for one workflow, most recent first.
    async fn executions_for_workflow(
        &self,
        workflow_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<Execution>>;

    /// Most recent executions across all workflows.
    async fn recent_executions(&self, limit: i64) -> AppResult<Vec<Execution>>;

    /// One execution by id.
    async fn get_execution(&self, execution_id: Uuid) -> AppResult<Option<Execution>>;

    /// Action rows for one execution, in action order.
    async fn action_executions(&self, execution_id: Uuid) -> AppResult<Vec<ActionExecution>>;
}

/// In-memory execution store, used by tests and local tooling.
#[derive(Default)]
pub struct MemoryExecutionStore {
    inner: std::sync::Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    executions: Vec<Execution>,
    actions: Vec<ActionExecution>,
}

impl MemoryExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionStore for MemoryExecutionStore {
    async fn create_execution(
        &self,
        workflow: &Workflow,
        event: &TriggerEvent,
    ) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        let mut inner = self.inner.lock().expect("store lock poisoned");

        if let Some(key) = &event.idempotency_key {
            let exists = inner
                .executions
                .iter()
                .any(|e| e.workflow_id == workflow.id && e.idempotency_key.as_deref() == Some(key));
            if exists {
                return Err(AppError::Conflict(format!(
                    "Execution already exists for workflow {} and key {}",
                    workflow.id, key
                )));
            }
        }

        inner.executions.push(Execution {
            id,
            workflow_id: workflow.id,
            trigger_type: event.trigger.to_string(),
            payload: event.payload.clone(),
            occurred_at: event.occurred_at,
            idempotency_key: event.idempotency_key.clone(),
            status: ExecutionStatus::Running.to_string(),
            started_at: Utc::now(),
            completed_at: None,
            error: None,
        });
        Ok(id)
    }

    async fn find_by_idempotency(
        &self,
        workflow_id: Uuid,
        key: &str,
    ) -> AppResult<Option<Uuid>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner
            .executions
            .iter()
            .find(|e| e.workflow_id == workflow_id && e.idempotency_key.as_deref() == Some(key))
            .map(|e| e.id))
    }

    async fn record_action_start(
        &self,
        execution_id: Uuid,
        action: &WorkflowAction,
    ) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.actions.push(ActionExecution {
            id,
            execution_id,
            action_id: action.id,
            position: action.position,
            status: ActionStatus::Running.to_string(),
            started_at: Some(Utc::now()),
            completed_at: None,
            detail: None,
            error: None,
        });
        Ok(id)
    }

    async fn record_action_skipped(
        &self,
        execution_id: Uuid,
        action: &WorkflowAction,
        status: ActionStatus,
    ) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.actions.push(ActionExecution {
            id,
            execution_id,
            action_id: action.id,
            position: action.position,
            status: status.to_string(),
            started_at: None,
            completed_at: Some(Utc::now()),
            detail: None,
            error: None,
        });
        Ok(id)
    }

    async fn record_action_outcome(
        &self,
        action_execution_id: Uuid,
        result: &ActionResult,
    ) -> AppResult<()> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let row = inner
            .actions
            .iter_mut()
            .find(|a| a.id == action_execution_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Action execution not found: {}", action_execution_id))
            })?;

        row.completed_at = Some(Utc::now());
        match result {
            ActionResult::Succeeded { detail } => {
                row.status = ActionStatus::Succeeded.to_string();
                row.detail = Some(detail.clone());
            }
            ActionResult::Failed { error } => {
                row.status = ActionStatus::Failed.to_string();
                row.error = Some(error.clone());
            }
        }
        Ok(())
    }

    async fn record_execution_end(
        &self,
        execution_id: Uuid,
        status: ExecutionStatus,
        error: Option<String>,
    ) -> AppResult<()> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let row = inner
            .executions
            .iter_mut()
            .find(|e| e.id == execution_id)
            .ok_or_else(|| AppError::NotFound(format!("Execution not found: {}", execution_id)))?;

        row.status = status.to_string();
        row.completed_at = Some(Utc::now());
        row.error = error;
        Ok(())
    }

    async fn executions_for_workflow(
        &self,
        workflow_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<Execution>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let mut rows: Vec<Execution> = inner
            .executions
            .iter()
            .filter(|e| e.workflow_id == workflow_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn recent_executions(&self, limit: i64) -> AppResult<Vec<Execution>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let mut rows = inner.executions.clone();
        rows.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn get_execution(&self, execution_id: Uuid) -> AppResult<Option<Execution>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner.executions.iter().find(|e| e.id == execution_id).cloned())
    }

    async fn action_executions(&self, execution_id: Uuid) -> AppResult<Vec<ActionExecution>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let mut rows: Vec<ActionExecution> = inner
            .actions
            .iter()
            .filter(|a| a.execution_id == execution_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.position);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::TriggerType;
    use serde_json::json;

    fn make_workflow() -> Workflow {
        Workflow {
            id: Uuid::new_v4(),
            name: "test".to_string(),
            description: None,
            trigger_type: "donation_received".to_string(),
            trigger_config: None,
            status: "active".to_string(),
            author_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_keyed_create_is_a_conflict() {
        let store = MemoryExecutionStore::new();
        let workflow = make_workflow();
        let event = TriggerEvent::new(TriggerType::DonationReceived, json!({"amount": 100}))
            .with_idempotency_key("pay-1");

        let first = store.create_execution(&workflow, &event).await.unwrap();
        let second = store.create_execution(&workflow, &event).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));

        // The key only dedupes within one workflow
        let other = make_workflow();
        store.create_execution(&other, &event).await.unwrap();

        assert_eq!(
            store.find_by_idempotency(workflow.id, "pay-1").await.unwrap(),
            Some(first)
        );
    }

    #[tokio::test]
    async fn test_unkeyed_creates_never_conflict() {
        let store = MemoryExecutionStore::new();
        let workflow = make_workflow();
        let event = TriggerEvent::new(TriggerType::DonationReceived, json!({"amount": 100}));

        store.create_execution(&workflow, &event).await.unwrap();
        store.create_execution(&workflow, &event).await.unwrap();
        assert_eq!(store.recent_executions(10).await.unwrap().len(), 2);
    }
}
