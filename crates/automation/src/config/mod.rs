//! Configuration loading for the Parish Automation server.

mod app;
mod database;
mod gateway;

pub use app::AppConfig;
pub use database::DatabaseConfig;
pub use gateway::GatewayConfig;
