//! Event and screen commands - record analytics into the cache
//!
//! Recorded items are written to the cache file and sent by the next
//! `beacon flush` or `beacon run`.

use anyhow::{Context, Result};
use beacon_config::Config;
use beacon_reporter::{AnalyticsEvent, AnalyticsReporter};
use clap::Args;

#[derive(Args, Debug)]
pub struct EventArgs {
    /// Event category (e.g. "editor")
    pub category: String,

    /// Event action (e.g. "export")
    pub action: String,

    /// Optional label
    #[arg(long)]
    pub label: Option<String>,

    /// Optional numeric value
    #[arg(long)]
    pub value: Option<i64>,
}

#[derive(Args, Debug)]
pub struct ScreenArgs {
    /// Name of the screen being shown
    pub view_name: String,
}

pub fn run_event(config: &Config, args: EventArgs) -> Result<()> {
    record(
        config,
        AnalyticsEvent::event(args.category, args.action, args.label, args.value),
    )
}

pub fn run_screen(config: &Config, args: ScreenArgs) -> Result<()> {
    record(config, AnalyticsEvent::screen_view(args.view_name))
}

fn record(config: &Config, event: AnalyticsEvent) -> Result<()> {
    let reporter = AnalyticsReporter::from_config(&config.reporter)
        .context("failed to initialize reporter")?;

    let kind = event.kind_name();
    reporter.record(event);

    let cached = reporter
        .save_cached_events_to_disk()
        .context("failed to cache event")?;

    println!("Recorded {kind} ({cached} cached)");
    Ok(())
}
