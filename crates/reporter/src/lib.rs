//! Beacon reporter - client-side analytics with pluggable transport.
//!
//! Application code records events into an [`AnalyticsReporter`]. Reports
//! flush the buffer through a [`NetworkHandler`], which turns each event
//! into a payload and transmits it. Failed reports are counted, and unsent
//! events survive restarts through an on-disk cache.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌────────────────┐
//! │ record_*()  │────▶│ AnalyticsReporter│────▶│ NetworkHandler │
//! │ (app code)  │     │ (buffer, errors) │     │ (payload+send) │
//! └─────────────┘     └──────────────────┘     └────────────────┘
//!                        ▲            │                │
//!                        │ ticks      │ unsent         │ HTTP POST
//!                 ┌────────────┐  ┌──────────┐         ▼
//!                 │ Scheduler  │  │EventCache│    collection endpoint
//!                 └────────────┘  └──────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use beacon_config::ReporterConfig;
//! use beacon_reporter::{AnalyticsReporter, ReportTrigger, schedule};
//!
//! # async fn example() -> beacon_reporter::Result<()> {
//! let config = ReporterConfig::default();
//! let reporter = Arc::new(AnalyticsReporter::from_config(&config)?);
//!
//! let (handle, task) = schedule::spawn(Arc::clone(&reporter), (&config).into());
//!
//! reporter.record_screen_view("Main");
//! reporter.record_event("editor", "export", Some("pdf".into()), None);
//!
//! handle.shutdown()?; // final report, leftovers cached to disk
//! let _ = task.await;
//! # Ok(())
//! # }
//! ```
//!
//! # Testing
//!
//! Swap in [`test_utils::MockNetworkHandler`] with
//! [`AnalyticsReporter::set_network_handler`] to observe payloads and force
//! failures without touching the network.

pub mod cache;
pub mod error;
pub mod event;
pub mod handler;
pub mod identity;
pub mod payload;
pub mod reporter;
pub mod schedule;
pub mod test_utils;

pub use cache::EventCache;
pub use error::{ReporterError, Result};
pub use event::{AnalyticsEvent, EventKind};
pub use handler::{HttpNetworkHandler, NetworkHandler};
pub use reporter::{AnalyticsReporter, ReportTrigger, ReporterOptions, SendOutcome};
pub use schedule::{ScheduleConfig, SchedulerHandle};
