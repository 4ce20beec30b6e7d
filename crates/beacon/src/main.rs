//! Beacon - client-side analytics reporter
//!
//! # Usage
//!
//! ```bash
//! # Record analytics (cached until the next flush)
//! beacon event editor export --label pdf --value 3
//! beacon screen Preferences
//!
//! # Send everything cached
//! beacon flush
//!
//! # Inspect what would be sent
//! beacon show --json
//!
//! # Flush periodically until Ctrl-C
//! beacon run --config beacon.toml
//! ```

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use beacon_config::{LogConfig, LogFormat, LogOutput};
use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Beacon - client-side analytics reporter
#[derive(Parser, Debug)]
#[command(name = "beacon")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record an action event
    Event(cmd::record::EventArgs),

    /// Record a screen view
    Screen(cmd::record::ScreenArgs),

    /// Send all cached events now
    Flush,

    /// Show cached events and the machine identifier
    Show(cmd::show::ShowArgs),

    /// Flush on the configured interval until interrupted
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = cmd::load_config(cli.config.as_deref())?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.log.level.as_str().to_string());
    init_logging(&level, &config.log)?;

    match cli.command {
        Command::Event(args) => cmd::record::run_event(&config, args),
        Command::Screen(args) => cmd::record::run_screen(&config, args),
        Command::Flush => cmd::flush::run(&config).await,
        Command::Show(args) => cmd::show::run(&config, args),
        Command::Run => cmd::run::run(&config).await,
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, log: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let writer = match log.output {
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
    };

    let layer = match log.format {
        LogFormat::Console => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    };

    tracing_subscriber::registry().with(layer).with(filter).init();

    Ok(())
}
