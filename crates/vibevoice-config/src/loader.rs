use std::path::Path;

use crate::Config;

/// Paths reserved by the synthesis and readiness routes
const RESERVED_PATHS: [&str; 2] = ["/tts", "/ready"];

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml_str(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if environment variable expansion, parsing,
    /// or validation fails
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting found
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_server_config()?;
        self.validate_model_config()?;
        Ok(())
    }

    fn validate_server_config(&self) -> anyhow::Result<()> {
        let server = &self.server;

        if server.service_name.trim().is_empty() {
            anyhow::bail!("server.service_name must not be empty");
        }

        if server.max_concurrent_requests == 0 {
            anyhow::bail!("server.max_concurrent_requests must be greater than 0");
        }

        if server.request_timeout_duration()?.is_zero() {
            anyhow::bail!("server.request_timeout must be greater than 0");
        }

        if let Some(cors) = &server.cors {
            cors.max_age_duration()?;
        }

        let health_path = &server.health.path;
        if !health_path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/', got '{health_path}'");
        }
        if server.health.enabled && RESERVED_PATHS.contains(&health_path.as_str()) {
            anyhow::bail!("server.health.path '{health_path}' collides with a built-in route");
        }

        Ok(())
    }

    fn validate_model_config(&self) -> anyhow::Result<()> {
        let model = &self.model;

        if model.max_text_chars == 0 {
            anyhow::bail!("model.max_text_chars must be greater than 0");
        }

        if model.cuda_device_id < 0 {
            anyhow::bail!("model.cuda_device_id must not be negative");
        }

        model.primary.location()?;
        model.fallback.location()?;
        model.fallback.vocoder.location()?;
        model.fallback.speaker.location()?;

        if model.fallback.speaker.dimension == 0 {
            anyhow::bail!("model.fallback.speaker.dimension must be greater than 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Write, time::Duration};

    use secrecy::ExposeSecret;

    use crate::{AllowList, ArtifactLocation, Config, DevicePreference, telemetry::LogFormat};

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();

        assert!(config.server.listen_address.is_none());
        assert_eq!(config.server.service_name, "qualia-vibevoice");
        assert_eq!(config.server.max_concurrent_requests, 10);
        assert_eq!(config.server.request_timeout_duration().unwrap(), Duration::from_secs(60));
        assert!(config.server.health.enabled);
        assert_eq!(config.server.health.path, "/health");
        assert_eq!(config.model.max_text_chars, 1000);
        assert!(config.telemetry.is_none());
        assert!(config.server.cors.is_none());
    }

    #[test]
    fn full_file_parses() {
        let raw = r#"
            [server]
            listen_address = "127.0.0.1:9000"
            service_name = "voice"
            request_timeout = "2m"
            max_concurrent_requests = 4

            [server.health]
            path = "/healthz"

            [server.cors]
            origins = ["https://voice.example"]
            max_age = "1h"

            [model]
            device = "cpu"
            max_text_chars = 500
            hf_token = "hf_secret"

            [model.primary]
            path = "/models/primary"

            [model.fallback]
            repo = "org/speecht5"

            [model.fallback.speaker]
            path = "/models/speakers"
            file = "xvectors.npy"
            index = 7306

            [telemetry]
            log_format = "json"
        "#;

        let config = Config::from_toml_str(raw).unwrap();

        assert_eq!(config.server.listen_address, Some("127.0.0.1:9000".parse().unwrap()));
        assert_eq!(config.server.service_name, "voice");
        assert_eq!(config.server.request_timeout_duration().unwrap(), Duration::from_secs(120));
        assert_eq!(config.server.max_concurrent_requests, 4);
        assert_eq!(config.server.health.path, "/healthz");
        let cors = config.server.cors.as_ref().unwrap();
        assert_eq!(cors.origins, AllowList::Only(vec!["https://voice.example".to_string()]));
        assert_eq!(cors.max_age_duration().unwrap(), Some(Duration::from_secs(3600)));
        assert_eq!(config.model.device, DevicePreference::Cpu);
        assert_eq!(config.model.max_text_chars, 500);
        assert_eq!(config.model.hf_token.as_ref().unwrap().expose_secret(), "hf_secret");
        assert_eq!(
            config.model.primary.location().unwrap(),
            ArtifactLocation::Local("/models/primary".into())
        );
        assert_eq!(config.model.fallback.speaker.index, 7306);
        assert_eq!(config.model.fallback.speaker.file, "xvectors.npy");
        assert_eq!(config.telemetry.unwrap().log_format, LogFormat::Json);
    }

    #[test]
    fn env_placeholders_are_expanded() {
        temp_env::with_var("VV_LOADER_SERVICE", Some("from-env"), || {
            let config = Config::from_toml_str("[server]\nservice_name = \"{{ env.VV_LOADER_SERVICE }}\"").unwrap();
            assert_eq!(config.server.service_name, "from-env");
        });
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Config::from_toml_str("[server]\nlisten_port = 80").unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = Config::from_toml_str("[server]\nmax_concurrent_requests = 0").unwrap_err();
        assert!(err.to_string().contains("max_concurrent_requests"));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = Config::from_toml_str("[server]\nrequest_timeout = \"soon\"").unwrap_err();
        assert!(err.to_string().contains("request_timeout"));

        let err = Config::from_toml_str("[server]\nrequest_timeout = \"0s\"").unwrap_err();
        assert!(err.to_string().contains("greater than 0"));
    }

    #[test]
    fn health_path_must_not_shadow_synthesis_route() {
        let err = Config::from_toml_str("[server.health]\npath = \"/tts\"").unwrap_err();
        assert!(err.to_string().contains("collides"));

        let err = Config::from_toml_str("[server.health]\npath = \"health\"").unwrap_err();
        assert!(err.to_string().contains("must start with '/'"));
    }

    #[test]
    fn bad_cors_max_age_is_rejected() {
        let err = Config::from_toml_str("[server.cors]\nmax_age = \"soon\"").unwrap_err();
        assert!(err.to_string().contains("server.cors.max_age"));
    }

    #[test]
    fn zero_text_limit_is_rejected() {
        let err = Config::from_toml_str("[model]\nmax_text_chars = 0").unwrap_err();
        assert!(err.to_string().contains("max_text_chars"));
    }

    #[test]
    fn artifact_source_must_be_set() {
        let err = Config::from_toml_str("[model.fallback.vocoder]\nrepo = \"\"").unwrap_err();
        assert!(err.to_string().contains("model.fallback.vocoder"));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[model]\ndevice = \"cuda\"\ncuda_device_id = 1").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.model.device, DevicePreference::Cuda);
        assert_eq!(config.model.cuda_device_id, 1);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(std::path::Path::new("/nonexistent/vibevoice.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
