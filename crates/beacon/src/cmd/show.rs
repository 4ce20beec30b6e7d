//! Show command - display exactly what the next flush would send
//!
//! Reads the cache and machine identifier without writing either.

use anyhow::{Context, Result};
use beacon_config::Config;
use beacon_reporter::cache::default_cache_path;
use beacon_reporter::identity::{
    default_machine_id_path, generate_machine_identifier, read_machine_identifier,
};
use beacon_reporter::{AnalyticsEvent, EventCache, EventKind};
use clap::Args;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(config: &Config, args: ShowArgs) -> Result<()> {
    let reporter = &config.reporter;

    let id_path = reporter
        .machine_id_path
        .clone()
        .unwrap_or_else(default_machine_id_path);
    let machine_identifier =
        read_machine_identifier(&id_path).unwrap_or_else(generate_machine_identifier);

    let cache = EventCache::new(
        reporter
            .cache_path
            .clone()
            .unwrap_or_else(default_cache_path),
    );
    let events = cache.load().context("failed to read event cache")?;

    if args.json {
        let out = serde_json::json!({
            "machine_identifier": machine_identifier,
            "endpoint": reporter.endpoint,
            "cache_path": cache.path(),
            "events": events,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Machine identifier: {machine_identifier}");
    println!("Endpoint:           {}", reporter.endpoint);
    println!("Cache:              {}", cache.path().display());
    println!("Reporting enabled:  {}", reporter.is_enabled());
    println!();

    if events.is_empty() {
        println!("No cached events");
        return Ok(());
    }

    println!("{} cached event(s):", events.len());
    for event in &events {
        println!("  {}", describe(event));
    }

    Ok(())
}

fn describe(event: &AnalyticsEvent) -> String {
    match &event.kind {
        EventKind::Event {
            category,
            action,
            label,
            value,
        } => {
            let mut line = format!("[{}] event {category}/{action}", event.timestamp_ms);
            if let Some(label) = label {
                line.push_str(&format!(" label={label}"));
            }
            if let Some(value) = value {
                line.push_str(&format!(" value={value}"));
            }
            line
        }
        EventKind::ScreenView { view_name } => {
            format!("[{}] screenview {view_name}", event.timestamp_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_event() {
        let event = AnalyticsEvent::event("editor", "export", Some("pdf".into()), Some(3))
            .with_timestamp(10);
        assert_eq!(describe(&event), "[10] event editor/export label=pdf value=3");
    }

    #[test]
    fn test_describe_screen_view() {
        let event = AnalyticsEvent::screen_view("Main").with_timestamp(11);
        assert_eq!(describe(&event), "[11] screenview Main");
    }
}
