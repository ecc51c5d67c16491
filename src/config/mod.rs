//! Configuration management for taskboard-notify
//!
//! This module handles loading, parsing, and validating client configuration
//! from YAML files and environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// REST backend configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Retry configuration for rate-limited list calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Notification polling configuration
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Session credential configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(yaml);
        let config: Config = serde_yaml::from_str(&expanded)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables with prefix TASKBOARD_
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Ok(url) = std::env::var("TASKBOARD_API_URL") {
            config.api.base_url = url;
        }
        if let Ok(timeout) = std::env::var("TASKBOARD_API_TIMEOUT_MS") {
            config.api.timeout_ms = timeout
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid API timeout".to_string()))?;
        }

        if let Ok(interval) = std::env::var("TASKBOARD_POLL_INTERVAL_SECS") {
            config.notifications.poll_interval_secs = interval
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid poll interval".to_string()))?;
        }

        if let Ok(token) = std::env::var("TASKBOARD_TOKEN") {
            config.session.token = Some(token);
        }
        if let Ok(path) = std::env::var("TASKBOARD_TOKEN_FILE") {
            config.session.token_file = Some(path);
        }

        if let Ok(level) = std::env::var("TASKBOARD_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the client cannot operate with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::MissingRequired("api.base_url".to_string()));
        }
        if self.retry.delay_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "retry.delay_ms must be positive".to_string(),
            ));
        }
        if !(self.retry.backoff_factor >= 1.0) {
            return Err(ConfigError::InvalidValue(
                "retry.backoff_factor must be at least 1".to_string(),
            ));
        }
        if self.notifications.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "notifications.poll_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// REST backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Base URL every request path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ApiConfig {
    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

/// Retry configuration for rate-limited requests
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Wait before the first retry in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Multiplier applied to the wait after each retry
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_ms: default_delay_ms(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_backoff_factor() -> f64 {
    2.0
}

/// Notification polling configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationConfig {
    /// Interval between background refreshes in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Whether list fetches go through the retry executor
    #[serde(default = "default_retry_list")]
    pub retry_list: bool,
}

impl NotificationConfig {
    /// Poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            retry_list: default_retry_list(),
        }
    }
}

fn default_poll_interval() -> u64 {
    30
}

fn default_retry_list() -> bool {
    true
}

/// Session credential configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Access token given directly
    pub token: Option<String>,

    /// File the access token is persisted in
    pub token_file: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (`json` or `pretty`)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Configuration error types
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Error reading configuration file
    #[error("Failed to read configuration file: {0}")]
    FileRead(String),

    /// Error parsing configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

/// Expand environment variables in a string
///
/// Supports `${VAR_NAME}` syntax; unknown variables are left untouched.
fn expand_env_vars(input: &str) -> String {
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}")
        .expect("Invalid regex pattern for environment variable expansion");

    re.replace_all(input, |caps: &regex_lite::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test 1: Parse complete configuration from YAML
    #[test]
    fn test_parse_complete_yaml_config() {
        let yaml = r#"
api:
  base_url: "https://tasks.example.com/api"
  timeout_ms: 8000

retry:
  max_retries: 5
  delay_ms: 250
  backoff_factor: 1.5

notifications:
  poll_interval_secs: 10
  retry_list: false

session:
  token_file: "/tmp/taskboard/token"

logging:
  level: "debug"
  format: "pretty"
"#;

        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(config.api.base_url, "https://tasks.example.com/api");
        assert_eq!(config.api.timeout(), Duration::from_millis(8000));

        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.delay_ms, 250);
        assert!((config.retry.backoff_factor - 1.5).abs() < f64::EPSILON);

        assert_eq!(config.notifications.poll_interval(), Duration::from_secs(10));
        assert!(!config.notifications.retry_list);

        assert_eq!(config.session.token, None);
        assert_eq!(
            config.session.token_file,
            Some("/tmp/taskboard/token".to_string())
        );

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
    }

    // Test 2: Default values are applied for missing fields
    #[test]
    fn test_default_values_applied() {
        let yaml = r#"
api:
  base_url: "http://127.0.0.1:9000"
"#;

        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.api.timeout_ms, 5000);

        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.delay_ms, 1000);
        assert!((config.retry.backoff_factor - 2.0).abs() < f64::EPSILON);

        assert_eq!(config.notifications.poll_interval_secs, 30);
        assert!(config.notifications.retry_list);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "json");
    }

    // Test 3: Environment variable expansion
    #[test]
    fn test_env_var_expansion() {
        std::env::set_var("TEST_TASKBOARD_TOKEN", "secret-token");

        let yaml = r#"
session:
  token: "${TEST_TASKBOARD_TOKEN}"
"#;

        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.session.token, Some("secret-token".to_string()));

        std::env::remove_var("TEST_TASKBOARD_TOKEN");
    }

    // Test 4: Unknown variables are kept verbatim
    #[test]
    fn test_unknown_env_var_left_in_place() {
        let expanded = expand_env_vars("token: ${TASKBOARD_SURELY_UNSET_VAR}");
        assert_eq!(expanded, "token: ${TASKBOARD_SURELY_UNSET_VAR}");
    }

    // Test 5: from_env loads config from environment variables
    #[test]
    fn test_from_env() {
        std::env::set_var("TASKBOARD_API_URL", "http://env-host/api");
        std::env::set_var("TASKBOARD_API_TIMEOUT_MS", "1200");
        std::env::set_var("TASKBOARD_POLL_INTERVAL_SECS", "15");
        std::env::set_var("TASKBOARD_TOKEN", "env-token");

        let config = Config::from_env().unwrap();

        assert_eq!(config.api.base_url, "http://env-host/api");
        assert_eq!(config.api.timeout_ms, 1200);
        assert_eq!(config.notifications.poll_interval_secs, 15);
        assert_eq!(config.session.token, Some("env-token".to_string()));

        std::env::remove_var("TASKBOARD_API_URL");
        std::env::remove_var("TASKBOARD_API_TIMEOUT_MS");
        std::env::remove_var("TASKBOARD_POLL_INTERVAL_SECS");
        std::env::remove_var("TASKBOARD_TOKEN");
    }

    // Test 6: Parse error for invalid YAML
    #[test]
    fn test_parse_error_invalid_yaml() {
        let yaml = r#"
retry:
  max_retries: "many"
"#;

        match Config::from_yaml(yaml) {
            Err(ConfigError::Parse(msg)) => assert!(msg.contains("Failed to parse YAML")),
            other => panic!("Expected ConfigError::Parse, got {:?}", other),
        }
    }

    // Test 7: Validation rejects unusable retry settings
    #[test]
    fn test_validation_rejects_bad_retry() {
        let zero_delay = "retry:\n  delay_ms: 0\n";
        assert!(matches!(
            Config::from_yaml(zero_delay),
            Err(ConfigError::InvalidValue(_))
        ));

        let shrinking = "retry:\n  backoff_factor: 0.5\n";
        assert!(matches!(
            Config::from_yaml(shrinking),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    // Test 8: Validation rejects zero poll interval and empty base URL
    #[test]
    fn test_validation_rejects_bad_polling_and_url() {
        let zero_poll = "notifications:\n  poll_interval_secs: 0\n";
        assert!(matches!(
            Config::from_yaml(zero_poll),
            Err(ConfigError::InvalidValue(_))
        ));

        let empty_url = "api:\n  base_url: \"\"\n";
        assert!(matches!(
            Config::from_yaml(empty_url),
            Err(ConfigError::MissingRequired(_))
        ));
    }

    // Test 9: Empty YAML results in defaults
    #[test]
    fn test_empty_yaml_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
    }
}
