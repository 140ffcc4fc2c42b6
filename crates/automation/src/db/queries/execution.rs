//! Execution audit queries.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::models::{ActionExecution, Execution};
use crate::db::DbPool;
use crate::error::AppResult;

/// Insert a new execution row.
#[allow(clippy::too_many_arguments)]
pub async fn insert_execution(
    pool: &DbPool,
    id: Uuid,
    workflow_id: Uuid,
    trigger_type: &str,
    payload: &serde_json::Value,
    occurred_at: DateTime<Utc>,
    idempotency_key: Option<&str>,
    status: &str,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO parish.workflow_execution
            (id, workflow_id, trigger_type, payload, occurred_at, idempotency_key, status,
             started_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, now())
        "#,
    )
    .bind(id)
    .bind(workflow_id)
    .bind(trigger_type)
    .bind(payload)
    .bind(occurred_at)
    .bind(idempotency_key)
    .bind(status)
    .execute(pool)
    .await?;

    Ok(())
}

/// Find an execution id by (workflow, idempotency key).
pub async fn find_by_idempotency(
    pool: &DbPool,
    workflow_id: Uuid,
    key: &str,
) -> AppResult<Option<Uuid>> {
    let result: Option<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT id
        FROM parish.workflow_execution
        WHERE workflow_id = $1 AND idempotency_key = $2
        "#,
    )
    .bind(workflow_id)
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(result.map(|(id,)| id))
}

/// Close an execution with its terminal status.
pub async fn close_execution(
    pool: &DbPool,
    id: Uuid,
    status: &str,
    error: Option<&str>,
) -> AppResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE parish.workflow_execution
        SET status = $2, completed_at = now(), error = $3
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(error)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Insert an action-execution row. `started` controls whether `started_at`
/// is stamped (running actions) or `completed_at` (skipped actions).
#[allow(clippy::too_many_arguments)]
pub async fn insert_action_execution(
    pool: &DbPool,
    id: Uuid,
    execution_id: Uuid,
    action_id: Uuid,
    position: i32,
    status: &str,
    started: bool,
) -> AppResult<()> {
    if started {
        sqlx::query(
            r#"
            INSERT INTO parish.workflow_action_execution
                (id, execution_id, action_id, "position", status, started_at)
            VALUES ($1, $2, $3, $4, $5, now())
            "#,
        )
    } else {
        sqlx::query(
            r#"
            INSERT INTO parish.workflow_action_execution
                (id, execution_id, action_id, "position", status, completed_at)
            VALUES ($1, $2, $3, $4, $5, now())
            "#,
        )
    }
    .bind(id)
    .bind(execution_id)
    .bind(action_id)
    .bind(position)
    .bind(status)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record the terminal outcome of a started action.
pub async fn update_action_outcome(
    pool: &DbPool,
    id: Uuid,
    status: &str,
    detail: Option<&serde_json::Value>,
    error: Option<&str>,
) -> AppResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE parish.workflow_action_execution
        SET status = $2, detail = $3, error = $4, completed_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(detail)
    .bind(error)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Executions for one workflow, most recent first.
pub async fn executions_for_workflow(
    pool: &DbPool,
    workflow_id: Uuid,
    limit: i64,
) -> AppResult<Vec<Execution>> {
    let executions = sqlx::query_as::<_, Execution>(
        r#"
        SELECT id, workflow_id, trigger_type, payload, occurred_at, idempotency_key,
               status, started_at, completed_at, error
        FROM parish.workflow_execution
        WHERE workflow_id = $1
        ORDER BY started_at DESC
        LIMIT $2
        "#,
    )
    .bind(workflow_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(executions)
}

/// Most recent executions across all workflows.
pub async fn recent_executions(pool: &DbPool, limit: i64) -> AppResult<Vec<Execution>> {
    let executions = sqlx::query_as::<_, Execution>(
        r#"
        SELECT id, workflow_id, trigger_type, payload, occurred_at, idempotency_key,
               status, started_at, completed_at, error
        FROM parish.workflow_execution
        ORDER BY started_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(executions)
}

/// One execution by id.
pub async fn get_execution(pool: &DbPool, id: Uuid) -> AppResult<Option<Execution>> {
    let execution = sqlx::query_as::<_, Execution>(
        r#"
        SELECT id, workflow_id, trigger_type, payload, occurred_at, idempotency_key,
               status, started_at, completed_at, error
        FROM parish.workflow_execution
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(execution)
}

/// Action rows for one execution, in action order.
pub async fn action_executions(
    pool: &DbPool,
    execution_id: Uuid,
) -> AppResult<Vec<ActionExecution>> {
    let actions = sqlx::query_as::<_, ActionExecution>(
        r#"
        SELECT id, execution_id, action_id, "position", status, started_at, completed_at,
               detail, error
        FROM parish.workflow_action_execution
        WHERE execution_id = $1
        ORDER BY "position"
        "#,
    )
    .bind(execution_id)
    .fetch_all(pool)
    .await?;

    Ok(actions)
}
