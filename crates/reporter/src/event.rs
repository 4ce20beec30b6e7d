//! Analytics event types.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// What was tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// A user action, e.g. `("editor", "export", Some("pdf"), Some(3))`
    Event {
        category: String,
        action: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<i64>,
    },

    /// A screen (or window, or page) being shown
    ScreenView { view_name: String },
}

/// A single tracked occurrence waiting to be reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    /// Milliseconds since the Unix epoch when the event was recorded
    pub timestamp_ms: u64,

    #[serde(flatten)]
    pub kind: EventKind,
}

impl AnalyticsEvent {
    /// Create an action event stamped with the current time.
    pub fn event(
        category: impl Into<String>,
        action: impl Into<String>,
        label: Option<String>,
        value: Option<i64>,
    ) -> Self {
        Self {
            timestamp_ms: now_ms(),
            kind: EventKind::Event {
                category: category.into(),
                action: action.into(),
                label,
                value,
            },
        }
    }

    /// Create a screen view stamped with the current time.
    pub fn screen_view(view_name: impl Into<String>) -> Self {
        Self {
            timestamp_ms: now_ms(),
            kind: EventKind::ScreenView {
                view_name: view_name.into(),
            },
        }
    }

    /// Override the timestamp (milliseconds since Unix epoch).
    #[must_use]
    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    /// Short name of the event kind, for logs and display.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            EventKind::Event { .. } => "event",
            EventKind::ScreenView { .. } => "screenview",
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
