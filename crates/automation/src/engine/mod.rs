//! The workflow engine: event intake, trigger matching, condition
//! evaluation, action execution and the audit trail around it all.

pub mod condition;
pub mod event;
pub mod executor;
pub mod registry;
pub mod runner;
pub mod store;

#[cfg(test)]
pub mod testing;

pub use event::TriggerEvent;
pub use executor::{ActionExecutor, ActionResult};
pub use registry::{WorkflowRegistry, WorkflowSnapshot};
pub use runner::WorkflowEngine;
pub use store::ExecutionStore;
