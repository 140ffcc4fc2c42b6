//! HTTP handlers, organized by domain.

pub mod events;
pub mod executions;
pub mod health;
pub mod workflows;

pub use events::{ingest_event, manual_trigger};
pub use health::{api_health, health_check};
