//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for environment variable {key}")]
    Env { key: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the runtime configuration: optional file, then process environment, then validation.
pub fn load(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    load_with(path, |key| std::env::var(key).ok())
}

/// [`load`] with a caller-supplied variable lookup.
pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ServiceConfig::default(),
    };

    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment-style settings onto `config`.
///
/// `lookup` resolves a variable name to its value.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("ORDERS_BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Some(v) = lookup("PARTS_BASE_URL") {
        config.parts.base_url = v;
    }
    if let Some(v) = lookup("PARTS_TIMEOUT_MS") {
        config.parts.timeout_ms = parse_var("PARTS_TIMEOUT_MS", v)?;
    }
    if let Some(v) = lookup("BREAKER_FAILURE_THRESHOLD") {
        config.breaker.failure_threshold = parse_var("BREAKER_FAILURE_THRESHOLD", v)?;
    }
    if let Some(v) = lookup("BREAKER_COOLDOWN_MS") {
        config.breaker.cooldown_ms = parse_var("BREAKER_COOLDOWN_MS", v)?;
    }
    if let Some(v) = lookup("ORDERS_LOG_LEVEL") {
        config.observability.log_level = v;
    }
    if let Some(v) = lookup("METRICS_ENABLED") {
        config.observability.metrics_enabled = parse_var("METRICS_ENABLED", v)?;
    }
    if let Some(v) = lookup("METRICS_ADDRESS") {
        config.observability.metrics_address = v;
    }
    Ok(())
}

fn parse_var<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { key, value })
}
