//! Configuration validation
//!
//! Validates reporter settings that serde cannot check on its own:
//! - Endpoint is an http(s) URL
//! - Interval and timeout are non-zero
//! - Buffer and error limits are non-zero

use std::time::Duration;

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_reporter(config)
}

fn validate_reporter(config: &Config) -> Result<()> {
    let reporter = &config.reporter;

    if !(reporter.endpoint.starts_with("http://") || reporter.endpoint.starts_with("https://")) {
        return Err(ConfigError::invalid_value(
            "reporter",
            "endpoint",
            format!("'{}' must be an http(s) URL", reporter.endpoint),
        ));
    }

    if reporter.interval == Duration::ZERO {
        return Err(ConfigError::invalid_value(
            "reporter",
            "interval",
            "must be greater than zero",
        ));
    }

    if reporter.send_timeout == Duration::ZERO {
        return Err(ConfigError::invalid_value(
            "reporter",
            "send_timeout",
            "must be greater than zero",
        ));
    }

    if reporter.max_cached_events == 0 {
        return Err(ConfigError::invalid_value(
            "reporter",
            "max_cached_events",
            "must be at least 1",
        ));
    }

    if reporter.max_send_errors == 0 {
        return Err(ConfigError::invalid_value(
            "reporter",
            "max_send_errors",
            "must be at least 1",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let err = Config::from_str("[reporter]\nendpoint = \"ftp://example.com\"").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "endpoint",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = Config::from_str("[reporter]\ninterval = \"0s\"").unwrap_err();
        assert!(err.to_string().contains("interval"));
    }

    #[test]
    fn test_rejects_zero_limits() {
        assert!(Config::from_str("[reporter]\nmax_cached_events = 0").is_err());
        assert!(Config::from_str("[reporter]\nmax_send_errors = 0").is_err());
    }
}
