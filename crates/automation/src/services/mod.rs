//! Service layer.
//!
//! Services encapsulate business logic and coordinate between handlers,
//! database queries and the engine.

pub mod workflow;

pub use workflow::WorkflowService;
