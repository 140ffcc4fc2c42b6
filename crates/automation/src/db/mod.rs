//! Database module: connectivity, models, queries and the durable
//! execution store, all on PostgreSQL via SQLx.

pub mod models;
pub mod pool;
pub mod queries;
pub mod store;

pub use pool::{create_pool, health_check, DbPool};
pub use store::PgExecutionStore;

use crate::error::AppResult;

/// Create the `parish` schema and the engine's tables if they do not exist.
/// Idempotent; runs at startup.
pub async fn ensure_schema(pool: &DbPool) -> AppResult<()> {
    let statements = [
        "CREATE SCHEMA IF NOT EXISTS parish",
        r#"
        CREATE TABLE IF NOT EXISTS parish.workflow (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            trigger_type TEXT NOT NULL,
            trigger_config JSONB,
            status TEXT NOT NULL DEFAULT 'draft',
            author_id TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_workflow_trigger_status
            ON parish.workflow (trigger_type, status)
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS parish.workflow_action (
            id UUID PRIMARY KEY,
            workflow_id UUID NOT NULL REFERENCES parish.workflow(id) ON DELETE CASCADE,
            kind TEXT NOT NULL,
            "position" INTEGER NOT NULL,
            config JSONB NOT NULL DEFAULT '{}'::jsonb,
            condition JSONB,
            delay_seconds BIGINT,
            UNIQUE (workflow_id, "position")
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS parish.workflow_execution (
            id UUID PRIMARY KEY,
            workflow_id UUID NOT NULL REFERENCES parish.workflow(id) ON DELETE CASCADE,
            trigger_type TEXT NOT NULL,
            payload JSONB NOT NULL DEFAULT 'null'::jsonb,
            occurred_at TIMESTAMPTZ NOT NULL,
            idempotency_key TEXT,
            status TEXT NOT NULL DEFAULT 'running',
            started_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            completed_at TIMESTAMPTZ,
            error TEXT
        )
        "#,
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_execution_idempotency
            ON parish.workflow_execution (workflow_id, idempotency_key)
            WHERE idempotency_key IS NOT NULL
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_execution_workflow
            ON parish.workflow_execution (workflow_id, started_at DESC)
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS parish.workflow_action_execution (
            id UUID PRIMARY KEY,
            execution_id UUID NOT NULL
                REFERENCES parish.workflow_execution(id) ON DELETE CASCADE,
            action_id UUID NOT NULL,
            "position" INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            started_at TIMESTAMPTZ,
            completed_at TIMESTAMPTZ,
            detail JSONB,
            error TEXT
        )
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_action_execution_order
            ON parish.workflow_action_execution (execution_id, "position")
        "#,
    ];

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("Database schema ensured");
    Ok(())
}
