//! Run command - flush on an interval until Ctrl-C

use std::sync::Arc;

use anyhow::{Context, Result};
use beacon_config::Config;
use beacon_reporter::{AnalyticsReporter, schedule};
use tracing::info;

pub async fn run(config: &Config) -> Result<()> {
    if !config.reporter.is_enabled() {
        info!("reporting disabled, nothing to do");
        return Ok(());
    }

    let reporter = Arc::new(
        AnalyticsReporter::from_config(&config.reporter)
            .context("failed to initialize reporter")?,
    );

    info!(
        endpoint = %config.reporter.endpoint,
        interval_secs = config.reporter.interval.as_secs(),
        pending = reporter.recorded_events().len(),
        "beacon running"
    );

    let (handle, task) = schedule::spawn(Arc::clone(&reporter), (&config.reporter).into());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    info!("shutting down");
    handle.shutdown().context("failed to stop scheduler")?;
    task.await.context("scheduler task panicked")?;

    info!(
        errors = reporter.error_count(),
        cached = reporter.recorded_events().len(),
        "beacon stopped"
    );

    Ok(())
}
