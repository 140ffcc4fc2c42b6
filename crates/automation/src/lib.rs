//! Parish Automation Library
//!
//! This crate provides the workflow automation service for the parish
//! church-management system, handling:
//!
//! - **Event Ingestion**: Domain events posted by the surrounding subsystems
//! - **Trigger Matching**: Active workflow definitions matched per event
//! - **Action Execution**: Ordered, conditionally gated, optionally delayed
//!   actions per matched workflow
//! - **Audit Trail**: One execution row per run, one row per action evaluated
//!
//! ## Architecture
//!
//! The engine is the only component with side effects on the audit trail;
//! delivery mechanics live behind narrow collaborator traits implemented
//! against the main ChMS application's internal API.
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from environment variables
//! - [`db`]: Database connectivity, models and the durable execution store
//! - [`engine`]: Matching, condition evaluation and the execution loop
//! - [`error`]: Custom error types with Axum integration
//! - [`handlers`]: HTTP route handlers
//! - [`services`]: Workflow definition service
//! - [`state`]: Shared application state
//! - [`template`]: Message personalization
//! - [`transport`]: Collaborator traits and the ChMS gateway

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod services;
pub mod state;
pub mod template;
pub mod transport;

pub use error::{AppError, AppResult};
