//! Reporter configuration
//!
//! Controls how buffered analytics are flushed and where they are sent.
//!
//! # Defaults
//!
//! - `enabled`: true
//! - `interval`: 5 minutes
//! - `send_timeout`: 10 seconds
//! - `max_cached_events`: 1000 (oldest dropped beyond this)
//! - `max_send_errors`: 10 (consecutive failures before sending is suspended)
//!
//! Cache and machine id files live under `~/.beacon/` unless overridden.
//! A leading `~` in either path is expanded to the home directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Default collection endpoint
pub const DEFAULT_ENDPOINT: &str = "https://collect.beacon.invalid/v1/collect";

/// Reporter configuration
///
/// # Example
///
/// ```toml
/// [reporter]
/// endpoint = "https://analytics.example.com/v1/collect"
/// interval = "1m"
/// app_name = "draft-control"
/// app_version = "2.3.0"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Enable reporting
    /// Default: true
    pub enabled: bool,

    /// HTTP endpoint payloads are POSTed to
    pub endpoint: String,

    /// How often buffered events are flushed
    /// Default: 5 minutes
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Timeout for a single payload send
    /// Default: 10 seconds
    #[serde(with = "humantime_serde")]
    pub send_timeout: Duration,

    /// Application name attached to screen views
    pub app_name: Option<String>,

    /// Application version attached to screen views
    /// Default: the reporter crate version
    pub app_version: Option<String>,

    /// Upper bound on buffered events
    pub max_cached_events: usize,

    /// Consecutive failed reports before sending is suspended.
    /// While suspended every `max_send_errors`-th report is a trial;
    /// a successful one resumes sending.
    pub max_send_errors: u64,

    /// Where unsent events are persisted
    /// Default: ~/.beacon/cached_events.json
    #[serde(deserialize_with = "deserialize_home_path")]
    pub cache_path: Option<PathBuf>,

    /// Where the machine identifier is stored
    /// Default: ~/.beacon/machine_id
    #[serde(deserialize_with = "deserialize_home_path")]
    pub machine_id_path: Option<PathBuf>,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            interval: Duration::from_secs(5 * 60),
            send_timeout: Duration::from_secs(10),
            app_name: None,
            app_version: None,
            max_cached_events: 1000,
            max_send_errors: 10,
            cache_path: None,
            machine_id_path: None,
        }
    }
}

impl ReporterConfig {
    /// Check if reporting is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Expand a leading `~` to the home directory.
///
/// Only `~` alone or `~/...` is expanded; `~user` and paths without a home
/// directory are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(path),
    };

    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(Path::new(rest)),
        None => PathBuf::from(path),
    }
}

fn deserialize_home_path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let path = Option::<String>::deserialize(deserializer)?;
    Ok(path.map(|p| expand_home(&p)))
}
