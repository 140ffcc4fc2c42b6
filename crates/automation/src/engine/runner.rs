//! Workflow engine.
//!
//! `execute_workflows` matches an event against the active workflow set and
//! returns promptly; each matched workflow runs on its own task. Within one
//! execution the actions run strictly sequentially in position order: delay
//! first, then condition, then the action itself. A failing action never
//! stops the run.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::models::{roll_up, ActionStatus, ExecutionStatus};
use crate::engine::condition::evaluate;
use crate::engine::event::TriggerEvent;
use crate::engine::executor::{ActionExecutor, ActionResult};
use crate::engine::registry::{matches, WorkflowRegistry, WorkflowSnapshot};
use crate::engine::store::ExecutionStore;
use crate::error::{AppError, AppResult};

/// Orchestrates workflow executions in response to trigger events.
#[derive(Clone)]
pub struct WorkflowEngine {
    registry: Arc<dyn WorkflowRegistry>,
    store: Arc<dyn ExecutionStore>,
    executor: Arc<ActionExecutor>,
    run_timeout: Duration,
}

impl WorkflowEngine {
    pub fn new(
        registry: Arc<dyn WorkflowRegistry>,
        store: Arc<dyn ExecutionStore>,
        executor: Arc<ActionExecutor>,
        run_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            executor,
            run_timeout,
        }
    }

    /// Match an event against the active workflows and start one execution
    /// per match. Returns the started execution ids without waiting for any
    /// of them to finish.
    pub async fn execute_workflows(&self, event: &TriggerEvent) -> AppResult<Vec<Uuid>> {
        let snapshots = self.registry.active_for_trigger(&event.trigger).await?;
        let mut started = Vec::new();

        for snapshot in snapshots {
            if !matches(&snapshot.workflow, event) {
                continue;
            }

            if let Some(key) = &event.idempotency_key {
                if let Some(existing) = self
                    .store
                    .find_by_idempotency(snapshot.workflow.id, key)
                    .await?
                {
                    info!(
                        workflow_id = %snapshot.workflow.id,
                        execution_id = %existing,
                        idempotency_key = %key,
                        "Event already processed for workflow, skipping"
                    );
                    continue;
                }
            }

            // The idempotency pre-check races against concurrent deliveries
            // of the same keyed event; the store reports the lost race as a
            // conflict, which means the event is already being handled.
            let execution_id = match self.store.create_execution(&snapshot.workflow, event).await {
                Ok(id) => id,
                Err(AppError::Conflict(_)) => {
                    info!(
                        workflow_id = %snapshot.workflow.id,
                        trigger = %event.trigger,
                        "Concurrent delivery already created this execution, skipping"
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };
            info!(
                workflow_id = %snapshot.workflow.id,
                workflow = %snapshot.workflow.name,
                execution_id = %execution_id,
                trigger = %event.trigger,
                "Starting workflow execution"
            );

            let engine = self.clone();
            let event = event.clone();
            tokio::spawn(async move {
                engine.run(execution_id, snapshot, event).await;
            });

            started.push(execution_id);
        }

        Ok(started)
    }

    async fn run(&self, execution_id: Uuid, snapshot: WorkflowSnapshot, event: TriggerEvent) {
        if let Err(e) = self.run_inner(execution_id, snapshot, &event).await {
            error!(
                execution_id = %execution_id,
                error = %e,
                "Workflow execution aborted on store failure"
            );
            // Best effort; the row may be unreachable for the same reason.
            let _ = self
                .store
                .record_execution_end(execution_id, ExecutionStatus::Failed, Some(e.to_string()))
                .await;
        }
    }

    async fn run_inner(
        &self,
        execution_id: Uuid,
        snapshot: WorkflowSnapshot,
        event: &TriggerEvent,
    ) -> AppResult<()> {
        let deadline = Instant::now() + self.run_timeout;
        let mut actions = snapshot.actions;
        actions.sort_by_key(|a| a.position);

        let mut statuses = Vec::with_capacity(actions.len());
        let mut deadline_hit = false;

        for action in &actions {
            if deadline_hit || Instant::now() >= deadline {
                deadline_hit = true;
                self.store
                    .record_action_skipped(execution_id, action, ActionStatus::Skipped)
                    .await?;
                statuses.push(ActionStatus::Skipped);
                continue;
            }

            // Delay applies before the condition is evaluated, so the
            // condition sees the payload at fire time, not enqueue time.
            if let Some(delay) = action.delay() {
                let due = Instant::now() + delay;
                if due >= deadline {
                    sleep_until(deadline).await;
                    deadline_hit = true;
                    warn!(
                        execution_id = %execution_id,
                        action_id = %action.id,
                        "Run deadline reached while waiting on action delay"
                    );
                    self.store
                        .record_action_skipped(execution_id, action, ActionStatus::Skipped)
                        .await?;
                    statuses.push(ActionStatus::Skipped);
                    continue;
                }
                sleep_until(due).await;
            }

            if let Some(condition) = &action.condition {
                if !condition.is_null() && !evaluate(condition, &event.payload) {
                    self.store
                        .record_action_skipped(
                            execution_id,
                            action,
                            ActionStatus::SkippedConditionFalse,
                        )
                        .await?;
                    statuses.push(ActionStatus::SkippedConditionFalse);
                    continue;
                }
            }

            let row_id = self.store.record_action_start(execution_id, action).await?;
            let result = self.executor.execute(action, event).await;
            if let ActionResult::Failed { error } = &result {
                warn!(
                    execution_id = %execution_id,
                    action_id = %action.id,
                    position = action.position,
                    error = %error,
                    "Action failed, continuing with remaining actions"
                );
            }
            self.store.record_action_outcome(row_id, &result).await?;
            statuses.push(result.status());
        }

        let status = roll_up(&statuses, deadline_hit);
        let error = if deadline_hit {
            Some("Run deadline exceeded before all actions could run".to_string())
        } else if status == ExecutionStatus::Failed {
            Some("Every executed action failed".to_string())
        } else {
            None
        };

        self.store
            .record_execution_end(execution_id, status, error)
            .await?;

        info!(
            execution_id = %execution_id,
            status = %status,
            actions = statuses.len(),
            "Workflow execution finished"
        );
        Ok(())
    }
}
