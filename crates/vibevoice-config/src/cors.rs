use std::time::Duration;

use serde::Deserialize;

/// Cross-origin access for browser callers of the synthesis endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Origins allowed to call the service
    #[serde(default)]
    pub origins: AllowList,
    /// Request headers a preflight may ask for
    #[serde(default)]
    pub headers: AllowList,
    /// How long browsers may cache a preflight answer (e.g. "10m")
    #[serde(default)]
    pub max_age: Option<String>,
    #[serde(default)]
    pub credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: AllowList::Any,
            headers: AllowList::Any,
            max_age: None,
            credentials: false,
        }
    }
}

impl CorsConfig {
    /// Parse the configured preflight cache lifetime
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a valid duration string
    pub fn max_age_duration(&self) -> anyhow::Result<Option<Duration>> {
        self.max_age
            .as_deref()
            .map(|raw| {
                duration_str::parse(raw).map_err(|e| anyhow::anyhow!("invalid server.cors.max_age '{raw}': {e}"))
            })
            .transpose()
    }
}

/// `"*"` or an explicit list of values
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawAllowList")]
pub enum AllowList {
    #[default]
    Any,
    Only(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAllowList {
    One(String),
    Many(Vec<String>),
}

impl From<RawAllowList> for AllowList {
    fn from(raw: RawAllowList) -> Self {
        let values = match raw {
            RawAllowList::One(value) => vec![value],
            RawAllowList::Many(values) => values,
        };

        if values.iter().any(|value| value == "*") {
            Self::Any
        } else {
            Self::Only(values)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_anywhere_in_list_allows_all() {
        let config: CorsConfig = toml::from_str(r#"origins = ["https://app.example", "*"]"#).unwrap();
        assert_eq!(config.origins, AllowList::Any);
        assert_eq!(config.headers, AllowList::Any);
    }

    #[test]
    fn single_origin_string_becomes_list() {
        let config: CorsConfig = toml::from_str(r#"origins = "https://app.example""#).unwrap();
        assert_eq!(config.origins, AllowList::Only(vec!["https://app.example".to_string()]));
    }

    #[test]
    fn max_age_is_a_duration_string() {
        let config: CorsConfig = toml::from_str(r#"max_age = "10m""#).unwrap();
        assert_eq!(config.max_age_duration().unwrap(), Some(Duration::from_secs(600)));

        let config: CorsConfig = toml::from_str(r#"max_age = "later""#).unwrap();
        assert!(config.max_age_duration().is_err());
    }
}
