//! Configuration handling for the application.
//!
//! Everything is read from environment variables. Most settings fall back to
//! development defaults; the generation provider credential has no default
//! and must always be supplied by the operator.

use std::env;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use crate::insights::RetryPolicy;
use crate::pipeline::OrchestratorConfig;

/// Environment variable names. Public so binaries and tests can refer to them.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_GEMINI_MODEL: &str = "GEMINI_MODEL";
pub const ENV_GEMINI_BASE_URL: &str = "GEMINI_BASE_URL";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";
pub const ENV_PIPELINE_CONCURRENCY: &str = "PIPELINE_CONCURRENCY";
pub const ENV_SUMMARY_MAX_ATTEMPTS: &str = "SUMMARY_MAX_ATTEMPTS";
pub const ENV_SUMMARY_BACKOFF_UNIT_MS: &str = "SUMMARY_BACKOFF_UNIT_MS";

const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PIPELINE_CONCURRENCY: usize = 4;
const DEFAULT_SUMMARY_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_SUMMARY_BACKOFF_UNIT_MS: u64 = 1000;

/// Application runtime configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    database_url: Option<String>,
    gemini_api_key: String,
    gemini_model: String,
    gemini_base_url: String,
    fetch_timeout: Duration,
    pipeline_concurrency: usize,
    summary_max_attempts: u32,
    summary_backoff_unit: Duration,
}

impl Config {
    /// Create a config with an explicit credential and defaults for the rest.
    pub fn new(gemini_api_key: impl Into<String>) -> Self {
        Self {
            database_url: None,
            gemini_api_key: gemini_api_key.into(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            pipeline_concurrency: DEFAULT_PIPELINE_CONCURRENCY,
            summary_max_attempts: DEFAULT_SUMMARY_MAX_ATTEMPTS,
            summary_backoff_unit: Duration::from_millis(DEFAULT_SUMMARY_BACKOFF_UNIT_MS),
        }
    }

    /// Load from environment variables.
    ///
    /// Fails when `GEMINI_API_KEY` is absent or blank, or when a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let gemini_api_key = env::var(ENV_GEMINI_API_KEY)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing {
                field: ENV_GEMINI_API_KEY,
            })?;

        let fetch_timeout_secs: u64 =
            parse_var(ENV_FETCH_TIMEOUT_SECS, DEFAULT_FETCH_TIMEOUT_SECS)?;
        let pipeline_concurrency: usize =
            parse_var(ENV_PIPELINE_CONCURRENCY, DEFAULT_PIPELINE_CONCURRENCY)?;
        let summary_max_attempts: u32 =
            parse_var(ENV_SUMMARY_MAX_ATTEMPTS, DEFAULT_SUMMARY_MAX_ATTEMPTS)?;
        let backoff_unit_ms: u64 =
            parse_var(ENV_SUMMARY_BACKOFF_UNIT_MS, DEFAULT_SUMMARY_BACKOFF_UNIT_MS)?;

        if pipeline_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_PIPELINE_CONCURRENCY,
                reason: "must be at least 1".to_string(),
            });
        }
        if summary_max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_SUMMARY_MAX_ATTEMPTS,
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            database_url: env::var(ENV_DATABASE_URL)
                .ok()
                .filter(|url| !url.is_empty()),
            gemini_api_key,
            gemini_model: env::var(ENV_GEMINI_MODEL)
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: env::var(ENV_GEMINI_BASE_URL)
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            pipeline_concurrency,
            summary_max_attempts,
            summary_backoff_unit: Duration::from_millis(backoff_unit_ms),
        })
    }

    /// PostgreSQL URL; `None` means the in-memory store is used.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }
    pub fn gemini_api_key(&self) -> &str {
        &self.gemini_api_key
    }
    pub fn gemini_model(&self) -> &str {
        &self.gemini_model
    }
    pub fn gemini_base_url(&self) -> &str {
        &self.gemini_base_url
    }
    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }
    pub fn pipeline_concurrency(&self) -> usize {
        self.pipeline_concurrency
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.summary_max_attempts,
            backoff_unit: self.summary_backoff_unit,
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            concurrency: self.pipeline_concurrency,
            fetch_timeout: self.fetch_timeout,
            retry: self.retry_policy(),
        }
    }
}

// The credential never ends up in logs.
impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("gemini_api_key", &"<redacted>")
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("pipeline_concurrency", &self.pipeline_concurrency)
            .field("summary_max_attempts", &self.summary_max_attempts)
            .field("summary_backoff_unit", &self.summary_backoff_unit)
            .finish()
    }
}

fn parse_var<T: FromStr>(field: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    match env::var(field) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                field,
                reason: e.to_string(),
            }),
        Err(_) => Ok(default),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    Missing { field: &'static str },
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing { field } => {
                write!(f, "missing required environment variable '{}'", field)
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}
