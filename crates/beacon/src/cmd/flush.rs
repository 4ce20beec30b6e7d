//! Flush command - send cached events now

use anyhow::{Context, Result, bail};
use beacon_config::Config;
use beacon_reporter::{AnalyticsReporter, ReportTrigger, SendOutcome};

pub async fn run(config: &Config) -> Result<()> {
    if !config.reporter.is_enabled() {
        println!("Reporting is disabled ([reporter] enabled = false)");
        return Ok(());
    }

    let reporter = AnalyticsReporter::from_config(&config.reporter)
        .context("failed to initialize reporter")?;

    match reporter.create_and_send_report(ReportTrigger::Manual).await {
        SendOutcome::Sent(n) => println!("Sent {n} event(s)"),
        SendOutcome::Empty => println!("Nothing to send"),
        SendOutcome::InFlight => println!("A report is already in progress"),
        SendOutcome::Suspended { errors } => {
            bail!("sending suspended after {errors} failed reports")
        }
        SendOutcome::Failed { sent, remaining } => {
            bail!("sent {sent} event(s), {remaining} kept in cache after a send failure")
        }
    }

    Ok(())
}
