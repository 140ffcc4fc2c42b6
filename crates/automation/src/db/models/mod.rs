//! Database models for workflow definitions and execution audit rows.

mod execution;
mod workflow;

pub use execution::{roll_up, ActionExecution, ActionStatus, Execution, ExecutionStatus};
pub use workflow::{ActionKind, TriggerType, Workflow, WorkflowAction, WorkflowStatus};
