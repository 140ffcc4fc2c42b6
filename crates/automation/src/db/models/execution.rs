//! Execution audit models.
//!
//! An execution is one run of one workflow against one triggering event; an
//! action execution is the audit record of one action within it. The engine
//! exclusively owns these rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Overall status of an execution. `Running` transitions to exactly one of
/// the terminal states and no state is re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Running,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::CompletedWithErrors => write!(f, "completed_with_errors"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl From<&str> for ExecutionStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "completed" => Self::Completed,
            "completed_with_errors" => Self::CompletedWithErrors,
            "failed" => Self::Failed,
            _ => Self::Running,
        }
    }
}

impl ExecutionStatus {
    /// Whether the status is terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Status of one action within an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Not yet evaluated.
    Pending,
    /// Condition evaluated false; the executor was never invoked.
    SkippedConditionFalse,
    /// Abandoned because the execution hit its run deadline.
    Skipped,
    /// Currently executing.
    Running,
    Succeeded,
    Failed,
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::SkippedConditionFalse => write!(f, "skipped_condition_false"),
            Self::Skipped => write!(f, "skipped"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl From<&str> for ActionStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "skipped_condition_false" => Self::SkippedConditionFalse,
            "skipped" => Self::Skipped,
            "running" => Self::Running,
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

impl ActionStatus {
    /// Whether the action was skipped (either kind) rather than executed.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skipped | Self::SkippedConditionFalse)
    }
}

/// Database execution record.
///
/// The triggering event is snapshotted at start so later workflow edits
/// cannot retroactively change history.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Execution {
    /// Primary key.
    pub id: Uuid,

    /// Workflow this execution belongs to.
    pub workflow_id: Uuid,

    /// Trigger type of the event snapshot.
    pub trigger_type: String,

    /// Event payload snapshot.
    pub payload: serde_json::Value,

    /// When the triggering event occurred.
    pub occurred_at: DateTime<Utc>,

    /// Natural idempotency key of the event, if it carried one.
    pub idempotency_key: Option<String>,

    /// Overall status (stored as text, see [`ExecutionStatus`]).
    pub status: String,

    /// When the execution started.
    pub started_at: DateTime<Utc>,

    /// When the execution reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,

    /// Execution-level error detail, for `failed` runs.
    pub error: Option<String>,
}

impl Execution {
    /// Typed overall status.
    pub fn state(&self) -> ExecutionStatus {
        ExecutionStatus::from(self.status.as_str())
    }
}

/// Database action-execution record. One row is created per action
/// evaluated, including skipped ones, in action order.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ActionExecution {
    /// Primary key.
    pub id: Uuid,

    /// Owning execution.
    pub execution_id: Uuid,

    /// Action definition this row audits.
    pub action_id: Uuid,

    /// The action's position at snapshot time.
    pub position: i32,

    /// Status (stored as text, see [`ActionStatus`]).
    pub status: String,

    /// When the action started running.
    pub started_at: Option<DateTime<Utc>>,

    /// When the action finished (or was skipped).
    pub completed_at: Option<DateTime<Utc>>,

    /// Success detail for the audit trail (recipient, provider id, ...).
    pub detail: Option<serde_json::Value>,

    /// Error detail when failed.
    pub error: Option<String>,
}

impl ActionExecution {
    /// Typed status.
    pub fn state(&self) -> ActionStatus {
        ActionStatus::from(self.status.as_str())
    }
}

/// Roll up per-action statuses into the execution's terminal status.
///
/// `completed` iff every non-skipped action succeeded; `failed` iff at least
/// one action ran and every one that ran failed; otherwise
/// `completed_with_errors`. A run that hit its deadline is never better than
/// `completed_with_errors`.
pub fn roll_up(statuses: &[ActionStatus], deadline_hit: bool) -> ExecutionStatus {
    let ran: Vec<&ActionStatus> = statuses.iter().filter(|s| !s.is_skip()).collect();
    let failed = ran.iter().filter(|s| ***s == ActionStatus::Failed).count();

    if !ran.is_empty() && failed == ran.len() {
        ExecutionStatus::Failed
    } else if failed > 0 || deadline_hit {
        ExecutionStatus::CompletedWithErrors
    } else {
        ExecutionStatus::Completed
    }
}
