//! Workflow definition queries.

use uuid::Uuid;

use crate::db::models::{Workflow, WorkflowAction};
use crate::db::DbPool;
use crate::error::AppResult;

/// Insert a new workflow definition.
pub async fn insert_workflow(pool: &DbPool, workflow: &Workflow) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO parish.workflow
            (id, name, description, trigger_type, trigger_config, status, author_id,
             created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(workflow.id)
    .bind(&workflow.name)
    .bind(&workflow.description)
    .bind(&workflow.trigger_type)
    .bind(&workflow.trigger_config)
    .bind(&workflow.status)
    .bind(&workflow.author_id)
    .bind(workflow.created_at)
    .bind(workflow.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a workflow by ID.
pub async fn get_workflow(pool: &DbPool, id: Uuid) -> AppResult<Option<Workflow>> {
    let workflow = sqlx::query_as::<_, Workflow>(
        r#"
        SELECT id, name, description, trigger_type, trigger_config, status, author_id,
               created_at, updated_at
        FROM parish.workflow
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(workflow)
}

/// List workflows, optionally filtered by status.
pub async fn list_workflows(pool: &DbPool, status: Option<&str>) -> AppResult<Vec<Workflow>> {
    let workflows = if let Some(s) = status {
        sqlx::query_as::<_, Workflow>(
            r#"
            SELECT id, name, description, trigger_type, trigger_config, status, author_id,
                   created_at, updated_at
            FROM parish.workflow
            WHERE status = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(s)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query_as::<_, Workflow>(
            r#"
            SELECT id, name, description, trigger_type, trigger_config, status, author_id,
                   created_at, updated_at
            FROM parish.workflow
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?
    };

    Ok(workflows)
}

/// Active workflows for a trigger type.
pub async fn active_workflows_for_trigger(
    pool: &DbPool,
    trigger_type: &str,
) -> AppResult<Vec<Workflow>> {
    let workflows = sqlx::query_as::<_, Workflow>(
        r#"
        SELECT id, name, description, trigger_type, trigger_config, status, author_id,
               created_at, updated_at
        FROM parish.workflow
        WHERE trigger_type = $1 AND status = 'active'
        "#,
    )
    .bind(trigger_type)
    .fetch_all(pool)
    .await?;

    Ok(workflows)
}

/// Set a workflow's status. Returns the number of rows updated.
pub async fn set_workflow_status(pool: &DbPool, id: Uuid, status: &str) -> AppResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE parish.workflow
        SET status = $2, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(status)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Delete a workflow (actions and executions cascade). Returns the number of
/// rows deleted.
pub async fn delete_workflow(pool: &DbPool, id: Uuid) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM parish.workflow WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Actions for a workflow, in position order.
pub async fn actions_for_workflow(
    pool: &DbPool,
    workflow_id: Uuid,
) -> AppResult<Vec<WorkflowAction>> {
    let actions = sqlx::query_as::<_, WorkflowAction>(
        r#"
        SELECT id, workflow_id, kind, "position", config, condition, delay_seconds
        FROM parish.workflow_action
        WHERE workflow_id = $1
        ORDER BY "position"
        "#,
    )
    .bind(workflow_id)
    .fetch_all(pool)
    .await?;

    Ok(actions)
}

/// Count the actions attached to a workflow.
pub async fn count_actions(pool: &DbPool, workflow_id: Uuid) -> AppResult<i64> {
    let result: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM parish.workflow_action WHERE workflow_id = $1")
            .bind(workflow_id)
            .fetch_one(pool)
            .await?;

    Ok(result.0)
}

/// Replace a workflow's action list wholesale, inside one transaction.
pub async fn replace_actions(
    pool: &DbPool,
    workflow_id: Uuid,
    actions: &[WorkflowAction],
) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM parish.workflow_action WHERE workflow_id = $1")
        .bind(workflow_id)
        .execute(&mut *tx)
        .await?;

    for action in actions {
        sqlx::query(
            r#"
            INSERT INTO parish.workflow_action
                (id, workflow_id, kind, "position", config, condition, delay_seconds)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(action.id)
        .bind(workflow_id)
        .bind(&action.kind)
        .bind(action.position)
        .bind(&action.config)
        .bind(&action.condition)
        .bind(action.delay_seconds)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
