//! Analytics reporter - buffers events and flushes them through a handler.
//!
//! Events are appended to an in-memory buffer. A report snapshots the buffer,
//! builds one payload per event with the active [`NetworkHandler`] and sends
//! them in order. Each event leaves the buffer only once the handler accepts
//! it. The first failed send stops the report, leaving the failed event and
//! everything after it buffered, and the error count goes up by one.
//!
//! After `max_send_errors` consecutive failed reports sending is suspended.
//! While suspended every `max_send_errors`-th report still goes ahead as a
//! trial; a fully successful one resumes normal sending.
//!
//! At most one report is in flight. Buffer inspection and the error hooks
//! may be called at any time, including while a report is sending.

use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::cache::{EventCache, default_cache_path};
use crate::error::Result;
use crate::event::{AnalyticsEvent, EventKind};
use crate::handler::{HttpNetworkHandler, NetworkHandler};
use crate::identity::{
    default_machine_id_path, generate_machine_identifier, load_or_create_machine_identifier,
};

/// Default upper bound on buffered events
pub const DEFAULT_MAX_CACHED_EVENTS: usize = 1000;

/// Default number of consecutive failed reports after which sending is suspended
pub const DEFAULT_MAX_SEND_ERRORS: u64 = 10;

/// Reporter settings independent of the network handler.
#[derive(Debug, Clone)]
pub struct ReporterOptions {
    /// Identifier attached to every payload
    pub machine_identifier: String,

    /// Version attached to screen view payloads
    pub app_version: String,

    /// Upper bound on buffered events; oldest are dropped beyond it
    pub max_cached_events: usize,

    /// Consecutive failed reports before sending is suspended
    pub max_send_errors: u64,

    /// Cache file for unsent events (None disables persistence)
    pub cache_path: Option<PathBuf>,
}

impl ReporterOptions {
    pub fn new(machine_identifier: impl Into<String>) -> Self {
        Self {
            machine_identifier: machine_identifier.into(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            max_cached_events: DEFAULT_MAX_CACHED_EVENTS,
            max_send_errors: DEFAULT_MAX_SEND_ERRORS,
            cache_path: None,
        }
    }

    #[must_use]
    pub fn with_app_version(mut self, app_version: impl Into<String>) -> Self {
        self.app_version = app_version.into();
        self
    }

    #[must_use]
    pub fn with_max_cached_events(mut self, max: usize) -> Self {
        self.max_cached_events = max.max(1);
        self
    }

    #[must_use]
    pub fn with_max_send_errors(mut self, max: u64) -> Self {
        self.max_send_errors = max;
        self
    }

    #[must_use]
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }
}

/// What started a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportTrigger {
    /// Periodic scheduler tick
    Timer,
    /// Explicit request (CLI, flush command)
    Manual,
    /// Final report before the process exits
    Shutdown,
}

impl fmt::Display for ReportTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timer => "timer",
            Self::Manual => "manual",
            Self::Shutdown => "shutdown",
        })
    }
}

/// Result of a single report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Every buffered event was sent
    Sent(usize),
    /// Nothing was buffered
    Empty,
    /// Another report is already sending
    InFlight,
    /// Skipped after too many consecutive failures
    Suspended { errors: u64 },
    /// A send failed; `remaining` events stay buffered
    Failed { sent: usize, remaining: usize },
}

impl SendOutcome {
    /// Whether the report finished without a send failure.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Sent(_) | Self::Empty)
    }
}

/// Buffered event tagged with a sequence number, so a send removes exactly
/// the entries it delivered even if the buffer changed meanwhile.
#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    event: AnalyticsEvent,
}

#[derive(Debug, Default)]
struct Buffer {
    entries: VecDeque<Entry>,
    next_seq: u64,
}

impl Buffer {
    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn push_back(&mut self, event: AnalyticsEvent) {
        let seq = self.next_seq();
        self.entries.push_back(Entry { seq, event });
    }

    /// Insert `events` ahead of everything buffered, keeping their order.
    fn prepend(&mut self, events: Vec<AnalyticsEvent>) {
        for event in events.into_iter().rev() {
            let seq = self.next_seq();
            self.entries.push_front(Entry { seq, event });
        }
    }

    /// Remove a delivered entry. No-op if it was cleared or dropped.
    fn remove(&mut self, seq: u64) {
        if let Some(pos) = self.entries.iter().position(|e| e.seq == seq) {
            self.entries.remove(pos);
        }
    }
}

/// Client-side analytics reporter.
///
/// Construct one per application and share it as `Arc<AnalyticsReporter>`.
pub struct AnalyticsReporter {
    options: ReporterOptions,
    handler: RwLock<Arc<dyn NetworkHandler>>,
    buffer: Mutex<Buffer>,
    errors: AtomicU64,
    /// Failed reports since the last fully successful one
    consecutive_failures: AtomicU64,
    /// Reports skipped since suspension (or since the last trial report)
    skipped: AtomicU64,
    dropped: AtomicU64,
    send_lock: tokio::sync::Mutex<()>,
    cache: Option<EventCache>,
}

impl AnalyticsReporter {
    /// Create a reporter with an explicit handler.
    pub fn new(options: ReporterOptions, handler: Arc<dyn NetworkHandler>) -> Self {
        let cache = options.cache_path.clone().map(EventCache::new);

        Self {
            options,
            handler: RwLock::new(handler),
            buffer: Mutex::new(Buffer::default()),
            errors: AtomicU64::new(0),
            consecutive_failures: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            send_lock: tokio::sync::Mutex::new(()),
            cache,
        }
    }

    /// Create a production reporter from configuration.
    ///
    /// Loads (or creates) the machine identifier, builds an HTTP handler and
    /// restores any events cached by a previous run.
    pub fn from_config(config: &beacon_config::ReporterConfig) -> Result<Self> {
        let id_path = config
            .machine_id_path
            .clone()
            .unwrap_or_else(default_machine_id_path);
        let machine_identifier = match load_or_create_machine_identifier(&id_path) {
            Ok(id) => id,
            Err(e) => {
                warn!(path = %id_path.display(), error = %e, "cannot persist machine identifier");
                generate_machine_identifier()
            }
        };

        let handler = HttpNetworkHandler::new(&config.endpoint, config.send_timeout)?
            .with_app_name(config.app_name.clone());

        let mut options = ReporterOptions::new(machine_identifier)
            .with_max_cached_events(config.max_cached_events)
            .with_max_send_errors(config.max_send_errors)
            .with_cache_path(config.cache_path.clone().unwrap_or_else(default_cache_path));
        if let Some(version) = &config.app_version {
            options = options.with_app_version(version.clone());
        }

        let reporter = Self::new(options, Arc::new(handler));
        if let Err(e) = reporter.load_cached_events_from_disk() {
            warn!(error = %e, "failed to restore cached events");
        }

        Ok(reporter)
    }

    pub fn machine_identifier(&self) -> &str {
        &self.options.machine_identifier
    }

    pub fn app_version(&self) -> &str {
        &self.options.app_version
    }

    pub fn options(&self) -> &ReporterOptions {
        &self.options
    }

    // =========================================================================
    // Recording
    // =========================================================================

    /// Buffer an event for the next report.
    pub fn record(&self, event: AnalyticsEvent) {
        let mut buffer = self.buffer.lock();
        buffer.push_back(event);
        self.enforce_cap(&mut buffer);
    }

    /// Buffer an action event.
    pub fn record_event(
        &self,
        category: impl Into<String>,
        action: impl Into<String>,
        label: Option<String>,
        value: Option<i64>,
    ) {
        self.record(AnalyticsEvent::event(category, action, label, value));
    }

    /// Buffer a screen view.
    pub fn record_screen_view(&self, view_name: impl Into<String>) {
        self.record(AnalyticsEvent::screen_view(view_name));
    }

    /// Snapshot of buffered events in insertion order.
    ///
    /// Events a report is currently sending are included until delivered.
    pub fn recorded_events(&self) -> Vec<AnalyticsEvent> {
        self.buffer
            .lock()
            .entries
            .iter()
            .map(|e| e.event.clone())
            .collect()
    }

    /// Empty the buffer, including events a report is currently sending.
    pub fn clear_recorded_events(&self) {
        self.buffer.lock().entries.clear();
    }

    /// Events discarded because the buffer was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn enforce_cap(&self, buffer: &mut Buffer) {
        let max = self.options.max_cached_events;
        if buffer.entries.len() <= max {
            return;
        }

        let excess = buffer.entries.len() - max;
        buffer.entries.drain(..excess);
        self.dropped.fetch_add(excess as u64, Ordering::Relaxed);
        warn!(dropped = excess, max_cached_events = max, "event buffer full, dropped oldest events");
    }

    // =========================================================================
    // Errors
    // =========================================================================

    /// Number of failed reports since the last clear.
    ///
    /// Cumulative; a successful report does not lower it.
    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::SeqCst)
    }

    /// Reset the error count and lift any suspension.
    pub fn clear_errors(&self) {
        self.errors.store(0, Ordering::SeqCst);
        self.consecutive_failures.store(0, Ordering::SeqCst);
        self.skipped.store(0, Ordering::SeqCst);
    }

    /// Count one failed report.
    pub fn record_send_error(&self) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.consecutive_failures.fetch_add(1, Ordering::SeqCst);
    }

    // =========================================================================
    // Sending
    // =========================================================================

    /// Replace the active network handler.
    ///
    /// A report already sending keeps the handler it started with.
    pub fn set_network_handler(&self, handler: Arc<dyn NetworkHandler>) {
        *self.handler.write() = handler;
    }

    /// Send buffered events through the active handler.
    ///
    /// Events stay buffered while they are sent and each one is removed
    /// once the handler accepts it, so dropping this future mid-send loses
    /// nothing.
    pub async fn send_report(&self) -> SendOutcome {
        let Ok(_guard) = self.send_lock.try_lock() else {
            debug!("report already in flight, skipping");
            return SendOutcome::InFlight;
        };

        if let Some(outcome) = self.check_suspended() {
            return outcome;
        }

        let pending: Vec<Entry> = self.buffer.lock().entries.iter().cloned().collect();
        if pending.is_empty() {
            return SendOutcome::Empty;
        }

        let handler = Arc::clone(&*self.handler.read());
        let total = pending.len();
        let mut sent = 0;

        for entry in &pending {
            let payload = self.build_payload(handler.as_ref(), &entry.event);
            if !handler.send_payload(&payload).await {
                break;
            }
            self.buffer.lock().remove(entry.seq);
            sent += 1;
        }

        if sent == total {
            self.consecutive_failures.store(0, Ordering::SeqCst);
            debug!(events = sent, "report sent");
            return SendOutcome::Sent(sent);
        }

        let remaining = total - sent;
        self.record_send_error();
        warn!(
            sent,
            remaining,
            errors = self.error_count(),
            "report failed, events kept for retry"
        );

        SendOutcome::Failed { sent, remaining }
    }

    /// Returns `Suspended` when this report should be skipped.
    ///
    /// After `max_send_errors` consecutive failures reports are skipped,
    /// except every `max_send_errors`-th one which goes ahead as a trial.
    /// A fully successful trial lifts the suspension.
    fn check_suspended(&self) -> Option<SendOutcome> {
        let max = self.options.max_send_errors;
        let failures = self.consecutive_failures.load(Ordering::SeqCst);
        if failures < max {
            return None;
        }

        let skipped = self.skipped.fetch_add(1, Ordering::SeqCst) + 1;
        if skipped >= max {
            self.skipped.store(0, Ordering::SeqCst);
            debug!(failures, "sending suspended, attempting trial report");
            return None;
        }

        let errors = self.error_count();
        warn!(
            errors,
            failures,
            max_send_errors = max,
            "sending suspended after repeated failures"
        );
        Some(SendOutcome::Suspended { errors })
    }

    /// Run one report and persist whatever is left unsent.
    pub async fn create_and_send_report(&self, trigger: ReportTrigger) -> SendOutcome {
        debug!(%trigger, pending = self.buffer.lock().entries.len(), "creating report");

        let outcome = self.send_report().await;

        match outcome {
            SendOutcome::InFlight => {}
            SendOutcome::Sent(n) => {
                info!(%trigger, events = n, "analytics report sent");
                self.sync_cache();
            }
            _ => self.sync_cache(),
        }

        outcome
    }

    fn build_payload(&self, handler: &dyn NetworkHandler, event: &AnalyticsEvent) -> Vec<u8> {
        match &event.kind {
            EventKind::ScreenView { view_name } => handler.create_screen_view_payload(
                view_name,
                &self.options.machine_identifier,
                &self.options.app_version,
            ),
            EventKind::Event { .. } => {
                handler.create_event_payload(event, &self.options.machine_identifier)
            }
        }
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Write buffered events to the cache file. Returns how many were written.
    ///
    /// An empty buffer removes the cache file. Without a cache path this
    /// does nothing.
    pub fn save_cached_events_to_disk(&self) -> Result<usize> {
        let Some(cache) = &self.cache else {
            return Ok(0);
        };

        let events = self.recorded_events();
        cache.save(&events)?;
        Ok(events.len())
    }

    /// Restore events from the cache file ahead of buffered ones.
    ///
    /// The file stays on disk until the next save rewrites or removes it,
    /// so call this once per reporter. Returns how many were restored.
    pub fn load_cached_events_from_disk(&self) -> Result<usize> {
        let Some(cache) = &self.cache else {
            return Ok(0);
        };

        let cached = cache.load()?;
        let count = cached.len();
        if count > 0 {
            debug!(path = %cache.path().display(), events = count, "restored cached events");
            let mut buffer = self.buffer.lock();
            buffer.prepend(cached);
            self.enforce_cap(&mut buffer);
        }
        Ok(count)
    }

    fn sync_cache(&self) {
        if let Err(e) = self.save_cached_events_to_disk() {
            warn!(error = %e, "failed to cache unsent events");
        }
    }
}

impl fmt::Debug for AnalyticsReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyticsReporter")
            .field("options", &self.options)
            .field("pending", &self.buffer.lock().entries.len())
            .field("errors", &self.error_count())
            .finish()
    }
}

#[cfg(test)]
#[path = "reporter_test.rs"]
mod reporter_test;
