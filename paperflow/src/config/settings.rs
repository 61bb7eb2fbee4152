//! Supervisor settings loaded from defaults, a JSON file and the environment.

use super::RetryPolicy;
use crate::errors::ConfigError;
use crate::models::CitationStyle;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "PAPERFLOW_";

/// Configuration for a [`Supervisor`](crate::pipeline::Supervisor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Retry policy shared by every stage.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Maximum number of papers turned into reference entries.
    #[serde(default = "default_max_references")]
    pub max_references: usize,
    /// Citation style used when the requirements do not name one.
    #[serde(default)]
    pub default_citation_style: CitationStyle,
    /// Whether an empty retrieval result aborts the run.
    #[serde(default = "default_empty_retrieval_is_fatal")]
    pub empty_retrieval_is_fatal: bool,
}

fn default_max_references() -> usize {
    15
}

fn default_empty_retrieval_is_fatal() -> bool {
    true
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            max_references: default_max_references(),
            default_citation_style: CitationStyle::default(),
            empty_retrieval_is_fatal: default_empty_retrieval_is_fatal(),
        }
    }
}

impl SupervisorConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the reference limit.
    #[must_use]
    pub fn with_max_references(mut self, max: usize) -> Self {
        self.max_references = max;
        self
    }

    /// Sets the default citation style.
    #[must_use]
    pub fn with_default_citation_style(mut self, style: CitationStyle) -> Self {
        self.default_citation_style = style;
        self
    }

    /// Sets whether an empty retrieval result aborts the run.
    #[must_use]
    pub fn with_empty_retrieval_is_fatal(mut self, fatal: bool) -> Self {
        self.empty_retrieval_is_fatal = fatal;
        self
    }

    /// Parses a configuration from a JSON string. Missing keys take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    /// Loads defaults, then `path` if it exists, then process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(p) if p.exists() => {
                tracing::debug!(path = %p.display(), "Loading supervisor config file");
                Self::from_json_file(p)?
            }
            _ => Self::default(),
        };
        base.with_env_overrides(std::env::vars())
    }

    /// Applies `PAPERFLOW_*` overrides from the given key/value pairs.
    ///
    /// Recognised keys: `PAPERFLOW_MAX_RETRIES`, `PAPERFLOW_RETRY_DELAY_SECONDS`,
    /// `PAPERFLOW_TIMEOUT_SECONDS`, `PAPERFLOW_MAX_REFERENCES`,
    /// `PAPERFLOW_CITATION_STYLE`. Unknown keys are ignored.
    pub fn with_env_overrides<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref().trim();
            match name {
                "MAX_RETRIES" => self.retry.max_retries = parse_env(key.as_ref(), value)?,
                "RETRY_DELAY_SECONDS" => {
                    self.retry.base_delay_seconds = parse_env(key.as_ref(), value)?;
                }
                "TIMEOUT_SECONDS" => self.retry.timeout_seconds = parse_env(key.as_ref(), value)?,
                "MAX_REFERENCES" => self.max_references = parse_env(key.as_ref(), value)?,
                "CITATION_STYLE" => {
                    self.default_citation_style = parse_env(key.as_ref(), value)?;
                }
                _ => {}
            }
        }
        self.validate()?;
        Ok(self)
    }

    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.retry.validate()
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid_value(key, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SupervisorConfig::default();
        assert_eq!(config.max_references, 15);
        assert_eq!(config.default_citation_style, CitationStyle::Apa);
        assert!(config.empty_retrieval_is_fatal);
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_from_json_str_partial() {
        let config = SupervisorConfig::from_json_str(
            r#"{"retry": {"max_retries": 1, "timeout_seconds": 5.0}, "max_references": 10}"#,
        )
        .unwrap();

        assert_eq!(config.retry.max_retries, 1);
        assert!((config.retry.timeout_seconds - 5.0).abs() < f64::EPSILON);
        assert!((config.retry.base_delay_seconds - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.max_references, 10);
        assert!(config.empty_retrieval_is_fatal);
    }

    #[test]
    fn test_from_json_str_rejects_invalid_policy() {
        let err = SupervisorConfig::from_json_str(r#"{"retry": {"timeout_seconds": 0}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPolicy(_)));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"default_citation_style": "ieee"}}"#).unwrap();

        let config = SupervisorConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.default_citation_style, CitationStyle::Ieee);
    }

    #[test]
    fn test_from_json_file_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();

        let err = SupervisorConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SupervisorConfig::load(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(config.max_references, 15);
        assert!(config.empty_retrieval_is_fatal);
    }

    #[test]
    fn test_env_overrides() {
        let config = SupervisorConfig::default()
            .with_env_overrides([
                ("PAPERFLOW_MAX_RETRIES", "5"),
                ("PAPERFLOW_RETRY_DELAY_SECONDS", "0.5"),
                ("PAPERFLOW_TIMEOUT_SECONDS", "12"),
                ("PAPERFLOW_MAX_REFERENCES", "3"),
                ("PAPERFLOW_CITATION_STYLE", "mla"),
                ("HOME", "/root"),
            ])
            .unwrap();

        assert_eq!(config.retry.max_retries, 5);
        assert!((config.retry.base_delay_seconds - 0.5).abs() < f64::EPSILON);
        assert!((config.retry.timeout_seconds - 12.0).abs() < f64::EPSILON);
        assert_eq!(config.max_references, 3);
        assert_eq!(config.default_citation_style, CitationStyle::Mla);
    }

    #[test]
    fn test_env_override_parse_error() {
        let err = SupervisorConfig::default()
            .with_env_overrides([("PAPERFLOW_MAX_RETRIES", "many")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PAPERFLOW_MAX_RETRIES"));
    }
}
