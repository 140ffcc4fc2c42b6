//! Application configuration for the Parish Automation server.

use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables.
///
/// Environment variables are prefixed with `PARISH_`:
/// - `PARISH_HOST`: Server bind address (default: "0.0.0.0")
/// - `PARISH_PORT`: Server port (default: 8090)
/// - `PARISH_DEBUG`: Enable debug mode (default: false)
/// - `PARISH_SERVER_NAME`: Server name for identification
/// - `PARISH_RUN_TIMEOUT_SECONDS`: Per-execution run deadline (default: 21600)
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable debug mode
    #[serde(default)]
    pub debug: bool,

    /// Server name for identification
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Per-execution run deadline in seconds. Bounds delay chains so a
    /// misconfigured workflow cannot hold a task open indefinitely.
    #[serde(default = "default_run_timeout")]
    pub run_timeout_seconds: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_server_name() -> String {
    "parish-automation".to_string()
}

fn default_run_timeout() -> u64 {
    21_600
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables are prefixed with `PARISH_`.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("PARISH_").from_env::<AppConfig>()
    }

    /// Get the server bind address as a string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Per-execution run deadline as a `Duration`.
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_seconds)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debug: false,
            server_name: default_server_name(),
            run_timeout_seconds: default_run_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8090);
        assert!(!config.debug);
        assert_eq!(config.run_timeout(), Duration::from_secs(21_600));
    }

    #[test]
    fn test_bind_address() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8090");
    }
}
