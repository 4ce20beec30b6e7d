//! Payload types.
//!
//! Defines the exact bytes sent to the collection endpoint. One payload
//! carries one hit, serialized as a JSON object using the measurement
//! protocol field names (`t` hit type, `cid` client id, `ec`/`ea`/`el`/`ev`
//! for events, `cd`/`an`/`av` for screen views).
//!
//! Builders here are pure: the same inputs always produce the same bytes.

use serde::{Deserialize, Serialize};

use crate::event::{AnalyticsEvent, EventKind};

/// Protocol version carried in every hit
pub const PROTOCOL_VERSION: u32 = 1;

/// A single hit as serialized on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    /// Protocol version
    pub v: u32,

    /// Hit type ("event" or "screenview")
    pub t: String,

    /// Client (machine) identifier
    pub cid: String,

    /// Event category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ec: Option<String>,

    /// Event action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ea: Option<String>,

    /// Event label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub el: Option<String>,

    /// Event value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev: Option<i64>,

    /// Screen name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cd: Option<String>,

    /// Application name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub an: Option<String>,

    /// Application version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub av: Option<String>,

    /// Client timestamp (ms since Unix epoch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<u64>,
}

impl Hit {
    fn new(hit_type: &str, machine_identifier: &str) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            t: hit_type.to_string(),
            cid: machine_identifier.to_string(),
            ec: None,
            ea: None,
            el: None,
            ev: None,
            cd: None,
            an: None,
            av: None,
            ts: None,
        }
    }

    /// Serialize to payload bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        // A struct of strings and integers always serializes.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// Build the payload for a tracked event.
///
/// Screen views passed here are encoded as screenview hits without
/// app metadata; use [`screen_view_payload`] to attach it.
pub fn event_payload(event: &AnalyticsEvent, machine_identifier: &str) -> Vec<u8> {
    let hit = match &event.kind {
        EventKind::Event {
            category,
            action,
            label,
            value,
        } => Hit {
            ec: Some(category.clone()),
            ea: Some(action.clone()),
            el: label.clone(),
            ev: *value,
            ts: Some(event.timestamp_ms),
            ..Hit::new("event", machine_identifier)
        },
        EventKind::ScreenView { view_name } => Hit {
            cd: Some(view_name.clone()),
            ts: Some(event.timestamp_ms),
            ..Hit::new("screenview", machine_identifier)
        },
    };

    hit.to_bytes()
}

/// Build the payload for a screen view.
pub fn screen_view_payload(
    view_name: &str,
    machine_identifier: &str,
    app_name: Option<&str>,
    app_version: &str,
) -> Vec<u8> {
    Hit {
        cd: Some(view_name.to_string()),
        an: app_name.map(str::to_string),
        av: Some(app_version.to_string()),
        ..Hit::new("screenview", machine_identifier)
    }
    .to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MACHINE: &str = "aa96d5506919a7a9f2b7ebe70b7e9c5e";

    #[test]
    fn test_event_payload_fields() {
        let event =
            AnalyticsEvent::event("editor", "export", Some("pdf".into()), Some(3)).with_timestamp(7);
        let bytes = event_payload(&event, MACHINE);

        let hit: Hit = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(hit.v, PROTOCOL_VERSION);
        assert_eq!(hit.t, "event");
        assert_eq!(hit.cid, MACHINE);
        assert_eq!(hit.ec.as_deref(), Some("editor"));
        assert_eq!(hit.ea.as_deref(), Some("export"));
        assert_eq!(hit.el.as_deref(), Some("pdf"));
        assert_eq!(hit.ev, Some(3));
        assert_eq!(hit.ts, Some(7));
    }

    #[test]
    fn test_event_payload_is_pure() {
        let event = AnalyticsEvent::event("app", "launch", None, None).with_timestamp(1);
        assert_eq!(event_payload(&event, MACHINE), event_payload(&event, MACHINE));
    }

    #[test]
    fn test_event_payload_omits_missing_fields() {
        let event = AnalyticsEvent::event("app", "launch", None, None).with_timestamp(1);
        let json = String::from_utf8(event_payload(&event, MACHINE)).unwrap();
        assert!(!json.contains("\"el\""));
        assert!(!json.contains("\"ev\""));
        assert!(!json.contains("\"cd\""));
    }

    #[test]
    fn test_screen_view_payload() {
        let bytes = screen_view_payload("Preferences", MACHINE, Some("draft"), "2.3.0");
        let json = String::from_utf8(bytes.clone()).unwrap();
        assert_eq!(
            json,
            r#"{"v":1,"t":"screenview","cid":"aa96d5506919a7a9f2b7ebe70b7e9c5e","cd":"Preferences","an":"draft","av":"2.3.0"}"#
        );

        // Pure
        assert_eq!(
            bytes,
            screen_view_payload("Preferences", MACHINE, Some("draft"), "2.3.0")
        );
    }

    #[test]
    fn test_screen_view_through_event_payload() {
        let event = AnalyticsEvent::screen_view("Main").with_timestamp(9);
        let hit: Hit = serde_json::from_slice(&event_payload(&event, MACHINE)).unwrap();
        assert_eq!(hit.t, "screenview");
        assert_eq!(hit.cd.as_deref(), Some("Main"));
        assert!(hit.av.is_none());
    }
}
