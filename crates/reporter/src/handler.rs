//! Network handlers - turn events into payloads and transmit them.
//!
//! The reporter never talks to the network directly. It goes through a
//! [`NetworkHandler`], which lets tests substitute [`MockNetworkHandler`]
//! for the production [`HttpNetworkHandler`].
//!
//! [`MockNetworkHandler`]: crate::test_utils::MockNetworkHandler

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{ReporterError, Result};
use crate::event::AnalyticsEvent;
use crate::payload;

/// Serialization and transmission of analytics payloads.
#[async_trait]
pub trait NetworkHandler: Send + Sync {
    /// Transmit one payload. Returns whether it was accepted.
    ///
    /// Never errors: every failure (connect, timeout, non-2xx) is `false`.
    async fn send_payload(&self, payload: &[u8]) -> bool;

    /// Serialize a single event tagged with the machine identifier.
    fn create_event_payload(&self, event: &AnalyticsEvent, machine_identifier: &str) -> Vec<u8>;

    /// Serialize a screen view with identity and version metadata.
    fn create_screen_view_payload(
        &self,
        view_name: &str,
        machine_identifier: &str,
        app_version: &str,
    ) -> Vec<u8>;
}

/// Production handler: POSTs JSON payloads over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpNetworkHandler {
    client: reqwest::Client,
    endpoint: String,
    app_name: Option<String>,
}

impl HttpNetworkHandler {
    /// Create a handler sending to `endpoint` with a per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReporterError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            app_name: None,
        })
    }

    /// Attach an application name to screen view payloads.
    #[must_use]
    pub fn with_app_name(mut self, app_name: Option<String>) -> Self {
        self.app_name = app_name;
        self
    }

    /// Endpoint payloads are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl NetworkHandler for HttpNetworkHandler {
    async fn send_payload(&self, payload: &[u8]) -> bool {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .body(payload.to_vec())
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                debug!(endpoint = %self.endpoint, bytes = payload.len(), "payload sent");
                true
            }
            Ok(resp) => {
                warn!(
                    endpoint = %self.endpoint,
                    status = resp.status().as_u16(),
                    "payload rejected by server"
                );
                false
            }
            Err(e) => {
                warn!(
                    endpoint = %self.endpoint,
                    timeout = e.is_timeout(),
                    error = %e,
                    "payload send failed"
                );
                false
            }
        }
    }

    fn create_event_payload(&self, event: &AnalyticsEvent, machine_identifier: &str) -> Vec<u8> {
        payload::event_payload(event, machine_identifier)
    }

    fn create_screen_view_payload(
        &self,
        view_name: &str,
        machine_identifier: &str,
        app_version: &str,
    ) -> Vec<u8> {
        payload::screen_view_payload(
            view_name,
            machine_identifier,
            self.app_name.as_deref(),
            app_version,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accept one connection, read the request, reply with `status_line`.
    async fn one_shot_server(
        status_line: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let task = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut request = Vec::new();
            // Read until the body arrives (headers + JSON object)
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request.ends_with(b"}") {
                    break;
                }
            }
            let reply = format!("{status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
            stream.write_all(reply.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{addr}/collect"), task)
    }

    #[tokio::test]
    async fn test_send_payload_success() {
        let (url, server) = one_shot_server("HTTP/1.1 200 OK").await;
        let handler = HttpNetworkHandler::new(url, Duration::from_secs(5)).unwrap();

        let body = br#"{"v":1}"#;
        assert!(handler.send_payload(body).await);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /collect"));
        assert!(request.to_lowercase().contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"v":1}"#));
    }

    #[tokio::test]
    async fn test_send_payload_server_error() {
        let (url, server) = one_shot_server("HTTP/1.1 503 Service Unavailable").await;
        let handler = HttpNetworkHandler::new(url, Duration::from_secs(5)).unwrap();

        assert!(!handler.send_payload(br#"{"v":1}"#).await);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_send_payload_connection_refused() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let handler =
            HttpNetworkHandler::new(format!("http://{addr}/collect"), Duration::from_secs(2))
                .unwrap();
        assert!(!handler.send_payload(b"{}").await);
    }

    #[test]
    fn test_screen_view_payload_carries_app_name() {
        let handler = HttpNetworkHandler::new("http://localhost/collect", Duration::from_secs(1))
            .unwrap()
            .with_app_name(Some("draft".to_string()));

        let bytes = handler.create_screen_view_payload("Main", "id", "1.0");
        let json = String::from_utf8(bytes).unwrap();
        assert!(json.contains(r#""an":"draft""#));
        assert!(json.contains(r#""av":"1.0""#));
        assert_eq!(handler.endpoint(), "http://localhost/collect");
    }
}
