//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use vibevoice_config::{Config, CorsConfig, HealthConfig, ModelConfig, ServerConfig};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig {
                        enabled: true,
                        ..HealthConfig::default()
                    },
                    ..ServerConfig::default()
                },
                model: ModelConfig::default(),
                telemetry: None,
            },
        }
    }

    pub fn with_service_name(mut self, name: &str) -> Self {
        self.config.server.service_name = name.to_owned();
        self
    }

    pub fn with_health_path(mut self, path: &str) -> Self {
        self.config.server.health.path = path.to_owned();
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    pub fn with_max_text_chars(mut self, max: usize) -> Self {
        self.config.model.max_text_chars = max;
        self
    }

    /// Request timeout as a duration string, e.g. `"200ms"`
    pub fn with_request_timeout(mut self, timeout: &str) -> Self {
        self.config.server.request_timeout = timeout.to_owned();
        self
    }

    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.config.server.max_concurrent_requests = max;
        self
    }

    pub fn with_cors(mut self, cors: CorsConfig) -> Self {
        self.config.server.cors = Some(cors);
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config.validate().expect("test config must be valid");
        self.config
    }
}
