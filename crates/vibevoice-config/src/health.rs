use serde::Deserialize;

/// Path of the liveness route unless overridden
pub const DEFAULT_HEALTH_PATH: &str = "/health";

/// Liveness endpoint configuration
///
/// The route answers `{"status": "ok", "service": ...}` whether or not a
/// model has finished loading.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HealthConfig {
    pub enabled: bool,
    pub path: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: DEFAULT_HEALTH_PATH.to_string(),
        }
    }
}
