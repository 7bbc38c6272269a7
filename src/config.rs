//! Configuration loader and validator for the roster client.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::api::RetryPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub api: Api,
    pub ai: Ai,
    pub retry: Retry,
    pub roster: Roster,
}

/// Class/student REST backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Api {
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Educator AI endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ai {
    pub endpoint: String,
}

/// Bounded retry settings. `max_attempts: 1` disables retries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Retry {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Roster {
    pub concurrent_fetch: bool,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_backoff: Duration::from_millis(self.retry.max_backoff_ms),
        }
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.api.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("api.base_url must be non-empty"));
    }
    if Url::parse(&cfg.api.base_url).is_err() {
        return Err(ConfigError::Invalid("api.base_url must be an absolute URL"));
    }
    if cfg.api.timeout_secs == 0 {
        return Err(ConfigError::Invalid("api.timeout_secs must be > 0"));
    }

    if cfg.ai.endpoint.trim().is_empty() {
        return Err(ConfigError::Invalid("ai.endpoint must be non-empty"));
    }
    if Url::parse(&cfg.ai.endpoint).is_err() {
        return Err(ConfigError::Invalid("ai.endpoint must be an absolute URL"));
    }

    if cfg.retry.max_attempts == 0 {
        return Err(ConfigError::Invalid("retry.max_attempts must be >= 1"));
    }
    if cfg.retry.max_backoff_ms < cfg.retry.base_delay_ms {
        return Err(ConfigError::Invalid(
            "retry.max_backoff_ms must be >= retry.base_delay_ms",
        ));
    }

    Ok(())
}

/// Returns the example YAML content printed by `edupal config-example`.
pub fn example() -> &'static str {
    r#"api:
  base_url: "http://localhost:3000/"
  timeout_secs: 30

ai:
  endpoint: "http://localhost:3000/api/educator-ai"

retry:
  max_attempts: 1
  base_delay_ms: 250
  max_backoff_ms: 4000

roster:
  concurrent_fetch: false
"#
}
