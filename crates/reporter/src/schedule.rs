//! Background scheduler - flushes the reporter on an interval.
//!
//! The scheduler runs in a dedicated task and never blocks callers.
//! Commands go over a bounded channel with try_send; if the channel is full
//! the command is dropped and the caller gets [`ReporterError::ChannelFull`].
//!
//! On shutdown (or when every handle is dropped) a final report is made and
//! whatever is still unsent is written to the cache file.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::{ReporterError, Result};
use crate::reporter::{AnalyticsReporter, ReportTrigger};

/// Channel buffer size - commands are tiny and idempotent
const CHANNEL_BUFFER: usize = 8;

/// Configuration for the scheduler task.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// How often to flush buffered events
    pub interval: Duration,

    /// Whether periodic reporting is enabled
    pub enabled: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5 * 60),
            enabled: true,
        }
    }
}

impl From<&beacon_config::ReporterConfig> for ScheduleConfig {
    fn from(config: &beacon_config::ReporterConfig) -> Self {
        Self {
            interval: config.interval,
            enabled: config.enabled,
        }
    }
}

/// Handle for controlling the scheduler task.
///
/// Cheap to clone. Commands never block.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Request an immediate report.
    pub fn flush(&self) -> Result<()> {
        self.command(SchedulerCommand::Flush)
    }

    /// Stop the scheduler after a final report.
    pub fn shutdown(&self) -> Result<()> {
        self.command(SchedulerCommand::Shutdown)
    }

    fn command(&self, cmd: SchedulerCommand) -> Result<()> {
        self.tx.try_send(cmd).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ReporterError::ChannelFull,
            mpsc::error::TrySendError::Closed(_) => ReporterError::SchedulerStopped,
        })
    }
}

/// Commands sent to the scheduler task.
enum SchedulerCommand {
    Flush,
    Shutdown,
}

/// Periodic flusher for an [`AnalyticsReporter`].
pub struct Scheduler {
    config: ScheduleConfig,
    reporter: Arc<AnalyticsReporter>,
    rx: mpsc::Receiver<SchedulerCommand>,
}

impl Scheduler {
    /// Create a scheduler and its handle.
    ///
    /// The scheduler must be spawned as a task using `run()`.
    pub fn new(reporter: Arc<AnalyticsReporter>, config: ScheduleConfig) -> (Self, SchedulerHandle) {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);

        let scheduler = Self {
            config,
            reporter,
            rx,
        };

        (scheduler, SchedulerHandle { tx })
    }

    /// Run the scheduler loop until shutdown or until all handles drop.
    pub async fn run(mut self) {
        if !self.config.enabled {
            debug!("reporting disabled, scheduler exiting");
            return;
        }

        debug!(
            interval_secs = self.config.interval.as_secs(),
            "analytics scheduler started"
        );

        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately; nothing is buffered yet.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.reporter.create_and_send_report(ReportTrigger::Timer).await;
                }
                cmd = self.rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::Flush) => {
                            trace!("flush requested");
                            self.reporter.create_and_send_report(ReportTrigger::Manual).await;
                        }
                        Some(SchedulerCommand::Shutdown) | None => {
                            debug!("analytics scheduler shutting down");
                            self.reporter.create_and_send_report(ReportTrigger::Shutdown).await;
                            break;
                        }
                    }
                }
            }
        }
    }
}

/// Spawn the scheduler as a background task.
pub fn spawn(
    reporter: Arc<AnalyticsReporter>,
    config: ScheduleConfig,
) -> (SchedulerHandle, JoinHandle<()>) {
    let (scheduler, handle) = Scheduler::new(reporter, config);
    let task = tokio::spawn(scheduler.run());
    (handle, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::NetworkHandler;
    use crate::reporter::ReporterOptions;
    use crate::test_utils::MockNetworkHandler;

    fn reporter(mock: &Arc<MockNetworkHandler>) -> Arc<AnalyticsReporter> {
        Arc::new(AnalyticsReporter::new(
            ReporterOptions::new("0123456789abcdef0123456789abcdef"),
            Arc::clone(mock) as Arc<dyn NetworkHandler>,
        ))
    }

    #[test]
    fn test_default_config() {
        let config = ScheduleConfig::default();
        assert!(config.enabled);
        assert_eq!(config.interval, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_scheduler_disabled() {
        let mock = Arc::new(MockNetworkHandler::succeeding());
        let config = ScheduleConfig {
            enabled: false,
            ..Default::default()
        };

        let (scheduler, _handle) = Scheduler::new(reporter(&mock), config);

        tokio::time::timeout(Duration::from_millis(100), scheduler.run())
            .await
            .expect("scheduler should exit quickly when disabled");
    }

    #[tokio::test]
    async fn test_flush_and_shutdown() {
        let mock = Arc::new(MockNetworkHandler::succeeding());
        let reporter = reporter(&mock);
        let (handle, task) = spawn(
            Arc::clone(&reporter),
            ScheduleConfig {
                interval: Duration::from_secs(3600),
                enabled: true,
            },
        );

        reporter.record_event("app", "launch", None, None);
        handle.flush().unwrap();

        reporter.record_event("app", "quit", None, None);
        handle.shutdown().unwrap();

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(mock.sent_count(), 2);
        assert!(reporter.recorded_events().is_empty());
        assert!(matches!(handle.flush(), Err(ReporterError::SchedulerStopped)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_tick_sends() {
        let mock = Arc::new(MockNetworkHandler::succeeding());
        let reporter = reporter(&mock);
        let (_handle, _task) = spawn(
            Arc::clone(&reporter),
            ScheduleConfig {
                interval: Duration::from_secs(60),
                enabled: true,
            },
        );

        reporter.record_screen_view("Main");
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(mock.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_channel_full() {
        let mock = Arc::new(MockNetworkHandler::succeeding());
        let (_scheduler, handle) = Scheduler::new(reporter(&mock), ScheduleConfig::default());

        // Nothing drains the channel
        for _ in 0..CHANNEL_BUFFER {
            handle.flush().unwrap();
        }
        assert!(matches!(handle.flush(), Err(ReporterError::ChannelFull)));
    }
}
