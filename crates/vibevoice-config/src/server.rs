use std::{net::SocketAddr, time::Duration};

use serde::Deserialize;

use crate::{cors::CorsConfig, health::HealthConfig};

/// Name reported by the health endpoint unless overridden
pub const DEFAULT_SERVICE_NAME: &str = "qualia-vibevoice";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_address: Option<SocketAddr>,
    /// Service name reported by the health endpoint
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Wall-clock limit for a single synthesis call (e.g. "60s", "2m")
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,
    /// Maximum number of synthesis calls in flight at once
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    #[serde(default)]
    pub health: HealthConfig,
    /// Cross-origin policy; no CORS headers are sent when absent
    #[serde(default)]
    pub cors: Option<CorsConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: None,
            service_name: default_service_name(),
            request_timeout: default_request_timeout(),
            max_concurrent_requests: default_max_concurrent_requests(),
            health: HealthConfig::default(),
            cors: None,
        }
    }
}

impl ServerConfig {
    /// Parse the configured request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a valid duration string
    pub fn request_timeout_duration(&self) -> anyhow::Result<Duration> {
        duration_str::parse(&self.request_timeout)
            .map_err(|e| anyhow::anyhow!("invalid server.request_timeout '{}': {e}", self.request_timeout))
    }
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

fn default_request_timeout() -> String {
    "60s".to_string()
}

const fn default_max_concurrent_requests() -> usize {
    10
}
