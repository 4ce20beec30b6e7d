//! Beacon Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file is a valid configuration.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use beacon_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[reporter]\ninterval = \"1m\"").unwrap();
//! assert_eq!(config.reporter.interval.as_secs(), 60);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! level = "debug"
//!
//! [reporter]
//! endpoint = "https://analytics.example.com/v1/collect"
//! app_name = "draft-control"
//! ```

mod error;
mod logging;
mod reporter;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use reporter::{DEFAULT_ENDPOINT, ReporterConfig};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Analytics reporter configuration
    pub reporter: ReporterConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML,
    /// or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::time::Duration;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.log.level, LogLevel::Info);
        assert!(config.reporter.enabled);
        assert_eq!(config.reporter.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[log]
level = "debug"
format = "json"

[reporter]
endpoint = "http://127.0.0.1:9000/collect"
interval = "15s"
app_name = "draft-control"
max_send_errors = 5
"#;
        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.reporter.endpoint, "http://127.0.0.1:9000/collect");
        assert_eq!(config.reporter.interval, Duration::from_secs(15));
        assert_eq!(config.reporter.app_name.as_deref(), Some("draft-control"));
        assert_eq!(config.reporter.max_send_errors, 5);
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("invalid { toml");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("beacon.toml");
        fs::write(&path, "[reporter]\nmax_cached_events = 10\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.reporter.max_cached_events, 10);
    }

    #[test]
    fn test_from_missing_file() {
        let result = Config::from_file("/nonexistent/beacon.toml");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }
}
