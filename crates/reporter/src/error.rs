//! Reporter error types.
//!
//! Send failures are not errors: handlers report them as `false` and the
//! reporter folds them into its error count. These cover everything else.

use thiserror::Error;

/// Result type for reporter operations
pub type Result<T> = std::result::Result<T, ReporterError>;

/// Errors that can occur outside of payload transmission.
#[derive(Debug, Error)]
pub enum ReporterError {
    /// Scheduler command channel is full (non-blocking send failed)
    #[error("scheduler channel full, command dropped")]
    ChannelFull,

    /// Scheduler task has exited
    #[error("scheduler is not running")]
    SchedulerStopped,

    /// Cache (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client could not be constructed
    #[error("http client error: {0}")]
    HttpClient(String),

    /// IO error (cache file, machine id file)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
