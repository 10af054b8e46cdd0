//! Configuration validation.
//!
//! Semantic checks only; serde already handled the syntax. All problems are
//! collected so an operator sees every mistake in one pass.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ServiceConfig;

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Validate a configuration, returning every error found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    match Url::parse(&config.parts.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            "parts.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            "parts.base_url",
            format!("'{}' is not a URL: {}", config.parts.base_url, e),
        )),
    }

    if config.parts.timeout_ms == 0 {
        errors.push(ValidationError::new("parts.timeout_ms", "must be greater than 0"));
    }

    if config.breaker.failure_threshold == 0 {
        errors.push(ValidationError::new(
            "breaker.failure_threshold",
            "must be at least 1",
        ));
    }

    if config.breaker.cooldown_ms == 0 {
        errors.push(ValidationError::new("breaker.cooldown_ms", "must be greater than 0"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    } else if config.timeouts.request_secs.saturating_mul(1000) <= config.parts.timeout_ms {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must exceed parts.timeout_ms so dependency timeouts surface as 503",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = ServiceConfig::default();
        config.parts.base_url = "ftp://parts".to_string();
        config.breaker.failure_threshold = 0;
        config.breaker.cooldown_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["parts.base_url", "breaker.failure_threshold", "breaker.cooldown_ms"]
        );
    }

    #[test]
    fn test_request_timeout_must_exceed_dependency_timeout() {
        let mut config = ServiceConfig::default();
        config.timeouts.request_secs = 1;
        config.parts.timeout_ms = 2_000;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeouts.request_secs");
    }

    #[test]
    fn test_huge_request_timeout_is_accepted() {
        let mut config = ServiceConfig::default();
        config.timeouts.request_secs = u64::MAX;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_metrics_address_ignored_when_disabled() {
        let mut config = ServiceConfig::default();
        config.observability.metrics_enabled = false;
        config.observability.metrics_address = "nowhere".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
