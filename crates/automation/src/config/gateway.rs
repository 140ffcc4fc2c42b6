//! Configuration for the ChMS internal API gateway client.
//!
//! Transport collaborators (directory lookups, email/SMS/notification
//! delivery, record updates) are reached through the main church-management
//! application's internal API. Credentials are injected here at construction
//! time; handlers never fetch settings ad hoc.

use serde::Deserialize;
use std::time::Duration;

/// Gateway client configuration loaded from environment variables.
///
/// Environment variables are prefixed with `PARISH_APP_`:
/// - `PARISH_APP_BASE_URL`: Base URL of the ChMS internal API
/// - `PARISH_APP_API_TOKEN`: Bearer token for internal API calls
/// - `PARISH_APP_TIMEOUT_SECONDS`: Request timeout (default: 30)
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the ChMS internal API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token for internal API calls
    #[serde(default)]
    pub api_token: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables are prefixed with `PARISH_APP_`.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("PARISH_APP_").from_env::<GatewayConfig>()
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: String::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }
}
