//! PostgreSQL-backed execution store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::models::{ActionExecution, ActionStatus, Execution, ExecutionStatus, Workflow,
    WorkflowAction};
use crate::db::queries;
use crate::db::DbPool;
use crate::engine::event::TriggerEvent;
use crate::engine::executor::ActionResult;
use crate::engine::store::ExecutionStore;
use crate::error::{AppError, AppResult};

/// Durable execution store on the `parish` schema.
#[derive(Clone)]
pub struct PgExecutionStore {
    pool: DbPool,
}

impl PgExecutionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExecutionStore for PgExecutionStore {
    async fn create_execution(
        &self,
        workflow: &Workflow,
        event: &TriggerEvent,
    ) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        let inserted = queries::execution::insert_execution(
            &self.pool,
            id,
            workflow.id,
            &event.trigger.to_string(),
            &event.payload,
            event.occurred_at,
            event.idempotency_key.as_deref(),
            &ExecutionStatus::Running.to_string(),
        )
        .await;

        match inserted {
            Ok(()) => Ok(id),
            // Concurrent keyed delivery lost the race against the partial
            // unique index on (workflow_id, idempotency_key).
            Err(AppError::Database(sqlx::Error::Database(e))) if e.is_unique_violation() => {
                Err(AppError::Conflict(format!(
                    "Execution already exists for workflow {} and this idempotency key",
                    workflow.id
                )))
            }
            Err(e) => Err(e),
        }
    }

    async fn find_by_idempotency(
        &self,
        workflow_id: Uuid,
        key: &str,
    ) -> AppResult<Option<Uuid>> {
        queries::execution::find_by_idempotency(&self.pool, workflow_id, key).await
    }

    async fn record_action_start(
        &self,
        execution_id: Uuid,
        action: &WorkflowAction,
    ) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        queries::execution::insert_action_execution(
            &self.pool,
            id,
            execution_id,
            action.id,
            action.position,
            &ActionStatus::Running.to_string(),
            true,
        )
        .await?;
        Ok(id)
    }

    async fn record_action_skipped(
        &self,
        execution_id: Uuid,
        action: &WorkflowAction,
        status: ActionStatus,
    ) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        queries::execution::insert_action_execution(
            &self.pool,
            id,
            execution_id,
            action.id,
            action.position,
            &status.to_string(),
            false,
        )
        .await?;
        Ok(id)
    }

    async fn record_action_outcome(
        &self,
        action_execution_id: Uuid,
        result: &ActionResult,
    ) -> AppResult<()> {
        let rows = match result {
            ActionResult::Succeeded { detail } => {
                queries::execution::update_action_outcome(
                    &self.pool,
                    action_execution_id,
                    &ActionStatus::Succeeded.to_string(),
                    Some(detail),
                    None,
                )
                .await?
            }
            ActionResult::Failed { error } => {
                queries::execution::update_action_outcome(
                    &self.pool,
                    action_execution_id,
                    &ActionStatus::Failed.to_string(),
                    None,
                    Some(error),
                )
                .await?
            }
        };

        if rows == 0 {
            return Err(AppError::NotFound(format!(
                "Action execution not found: {}",
                action_execution_id
            )));
        }
        Ok(())
    }

    async fn record_execution_end(
        &self,
        execution_id: Uuid,
        status: ExecutionStatus,
        error: Option<String>,
    ) -> AppResult<()> {
        let rows = queries::execution::close_execution(
            &self.pool,
            execution_id,
            &status.to_string(),
            error.as_deref(),
        )
        .await?;

        if rows == 0 {
            return Err(AppError::NotFound(format!(
                "Execution not found: {}",
                execution_id
            )));
        }
        Ok(())
    }

    async fn executions_for_workflow(
        &self,
        workflow_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<Execution>> {
        queries::execution::executions_for_workflow(&self.pool, workflow_id, limit).await
    }

    async fn recent_executions(&self, limit: i64) -> AppResult<Vec<Execution>> {
        queries::execution::recent_executions(&self.pool, limit).await
    }

    async fn get_execution(&self, execution_id: Uuid) -> AppResult<Option<Execution>> {
        queries::execution::get_execution(&self.pool, execution_id).await
    }

    async fn action_executions(&self, execution_id: Uuid) -> AppResult<Vec<ActionExecution>> {
        queries::execution::action_executions(&self.pool, execution_id).await
    }
}
