//! Test utilities for exercising the reporter without a network.
//!
//! [`MockNetworkHandler`] builds payloads with the real payload code and
//! records what would have been sent, so tests see the exact bytes.
//!
//! ```
//! use std::sync::Arc;
//! use beacon_reporter::test_utils::MockNetworkHandler;
//!
//! let mock = Arc::new(MockNetworkHandler::failing());
//! assert_eq!(mock.sent_count(), 0);
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::event::AnalyticsEvent;
use crate::handler::NetworkHandler;
use crate::payload;

/// Network handler that records payloads instead of sending them.
#[derive(Debug)]
pub struct MockNetworkHandler {
    succeed: AtomicBool,
    /// Remaining successes before failing; `usize::MAX` means unlimited
    successes_left: AtomicUsize,
    attempts: AtomicUsize,
    sent: Mutex<Vec<Vec<u8>>>,
}

impl MockNetworkHandler {
    /// A handler whose sends always succeed.
    pub fn succeeding() -> Self {
        Self::with_result(true)
    }

    /// A handler whose sends always fail.
    pub fn failing() -> Self {
        Self::with_result(false)
    }

    /// A handler that accepts `n` payloads and fails every send after that.
    pub fn failing_after(n: usize) -> Self {
        let mock = Self::succeeding();
        mock.successes_left.store(n, Ordering::SeqCst);
        mock
    }

    fn with_result(succeed: bool) -> Self {
        Self {
            succeed: AtomicBool::new(succeed),
            successes_left: AtomicUsize::new(usize::MAX),
            attempts: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Switch between succeeding and failing.
    pub fn set_succeed(&self, succeed: bool) {
        self.succeed.store(succeed, Ordering::SeqCst);
        self.successes_left.store(usize::MAX, Ordering::SeqCst);
    }

    /// Payloads accepted so far, in send order.
    pub fn sent_payloads(&self) -> Vec<Vec<u8>> {
        self.sent.lock().clone()
    }

    /// Number of payloads accepted.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Number of send attempts, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkHandler for MockNetworkHandler {
    async fn send_payload(&self, payload: &[u8]) -> bool {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if !self.succeed.load(Ordering::SeqCst) {
            return false;
        }

        let left = self.successes_left.load(Ordering::SeqCst);
        if left == 0 {
            return false;
        }
        if left != usize::MAX {
            self.successes_left.store(left - 1, Ordering::SeqCst);
        }

        self.sent.lock().push(payload.to_vec());
        true
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
        payload::screen_view_payload(view_name, machine_identifier, None, app_version)
    }
}
