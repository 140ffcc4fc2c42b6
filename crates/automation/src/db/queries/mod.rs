//! Database queries, organized by domain.

pub mod execution;
pub mod workflow;
