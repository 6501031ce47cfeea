//! Mock transport for testing.
//!
//! Replies are scripted in order and every request is recorded, so tests
//! can assert exactly how many round trips a job made and what it sent.

use crate::core::{HttpRequest, HttpResponse, ScanError, Transport};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One scripted outcome of [`MockTransport::send`].
#[derive(Debug, Clone)]
pub enum MockReply {
    /// The service answered.
    Response(HttpResponse),
    /// No response; reported as `ConnectionFailed`.
    ConnectionRefused,
    /// No response; reported as `Timeout`.
    Timeout,
}

/// A transport that replays scripted replies.
///
/// # Examples
///
/// ```rust
/// use metascan::transport::MockTransport;
/// use serde_json::json;
///
/// let transport = MockTransport::new()
///     .with_json(json!({"data_id": "abc123"}))
///     .with_json(json!({"scan_results": {"progress_percentage": 100, "scan_all_result_i": 0}}));
/// assert_eq!(transport.request_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    /// Replies returned in FIFO order.
    replies: Mutex<VecDeque<MockReply>>,
    /// Reply used once the script is exhausted.
    fallback: Option<HttpResponse>,
    /// Every request seen, in order.
    requests: Mutex<Vec<HttpRequest>>,
    /// Counter for send operations.
    request_count: AtomicU64,
}

impl MockTransport {
    /// Creates a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a reply to the script.
    pub fn with_reply(self, reply: MockReply) -> Self {
        self.push_reply(reply);
        self
    }

    /// Appends a response to the script.
    pub fn with_response(self, response: HttpResponse) -> Self {
        self.with_reply(MockReply::Response(response))
    }

    /// Appends a `200 OK` JSON response to the script.
    pub fn with_json(self, value: serde_json::Value) -> Self {
        self.with_response(HttpResponse::json(&value))
    }

    /// Sets the response returned after the script runs out.
    pub fn with_fallback(mut self, response: HttpResponse) -> Self {
        self.fallback = Some(response);
        self
    }

    /// Appends a reply (shared-reference version).
    pub fn push_reply(&self, reply: MockReply) {
        self.replies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(reply);
    }

    /// Appends a `200 OK` JSON response (shared-reference version).
    pub fn push_json(&self, value: serde_json::Value) {
        self.push_reply(MockReply::Response(HttpResponse::json(&value)));
    }

    /// Returns the number of requests sent.
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Returns a copy of every request sent so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Returns the most recent request.
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .last()
            .cloned()
    }

    /// Returns the number of scripted replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.replies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ScanError> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        let url = request.url.clone();
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);

        let next = self
            .replies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();

        match next {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::ConnectionRefused) => {
                Err(ScanError::connection_failed(url, "connection refused"))
            }
            Some(MockReply::Timeout) => Err(ScanError::timeout(
                format!("request to {}", url),
                Duration::from_secs(30),
            )),
            None => match &self.fallback {
                Some(response) => Ok(response.clone()),
                None => Err(ScanError::connection_failed(url, "no scripted response")),
            },
        }
    }
}
