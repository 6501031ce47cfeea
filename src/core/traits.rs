//! The transport seam.
//!
//! A scan job builds [`HttpRequest`]s and hands them to a [`Transport`];
//! the awaited response is the completion, and the job's parse-and-store
//! step runs as its continuation. The crate ships a `reqwest` transport
//! and a scripted mock; anything else (a proxy, a queueing layer that
//! fans out many requests) only has to implement [`Transport::send`].

use crate::core::error::ScanError;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::time::Duration;

/// Header carrying the caller's API key.
pub const HEADER_API_KEY: &str = "apikey";
/// Header carrying the target's display name.
pub const HEADER_FILENAME: &str = "filename";
/// Header carrying the password of a protected archive.
pub const HEADER_ARCHIVE_PASSWORD: &str = "archivepwd";

/// Sends HTTP requests for scan jobs.
///
/// Implementations report failures to obtain any response as
/// [`ScanError::ConnectionFailed`] or [`ScanError::Timeout`]. A response with
/// an error status is still a response: return it, the job maps the status.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Issues one request and resolves with the response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ScanError>;
}

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl Method {
    /// Returns the method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built request.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Header metadata; only present values are inserted.
    pub headers: BTreeMap<String, String>,
    /// Request body.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a `GET` request with no headers.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Creates a `POST` request with the given body.
    pub fn post(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: BTreeMap::new(),
            body: Some(body),
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds a header only if `value` is present.
    pub fn with_optional_header(self, name: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.with_header(name, value),
            None => self,
        }
    }

    /// Returns a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

impl Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: BTreeMap<&str, &str> = self
            .headers
            .iter()
            .map(|(k, v)| {
                let shown = if k.eq_ignore_ascii_case(HEADER_API_KEY)
                    || k.eq_ignore_ascii_case(HEADER_ARCHIVE_PASSWORD)
                {
                    "[REDACTED]"
                } else {
                    v.as_str()
                };
                (k.as_str(), shown)
            })
            .collect();

        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .finish()
    }
}

/// A response as returned by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Creates a `200 OK` response with a JSON body.
    pub fn json(value: &serde_json::Value) -> Self {
        Self::new(200, value.to_string())
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Maps non-success statuses to errors, passing 2xx responses through.
    pub fn error_for_status(self) -> Result<Self, ScanError> {
        match self.status {
            200..=299 => Ok(self),
            401 | 403 => Err(ScanError::AuthenticationFailed {
                reason: format!("HTTP {}: {}", self.status, self.body_excerpt()),
            }),
            429 => Err(ScanError::RateLimited {
                retry_after: Some(Duration::from_secs(60)),
            }),
            status => Err(ScanError::service_error(status, self.body_excerpt())),
        }
    }

    fn body_excerpt(&self) -> String {
        const LIMIT: usize = 256;
        let text = String::from_utf8_lossy(&self.body);
        match text.char_indices().nth(LIMIT) {
            Some((idx, _)) => format!("{}...", &text[..idx]),
            None => text.into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_header_omitted() {
        let request = HttpRequest::get("https://example.test/file")
            .with_optional_header(HEADER_ARCHIVE_PASSWORD, None)
            .with_header(HEADER_API_KEY, "k");

        assert_eq!(request.header(HEADER_API_KEY), Some("k"));
        assert!(!request.headers.contains_key(HEADER_ARCHIVE_PASSWORD));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let request = HttpRequest::post("https://example.test/file", b"body".to_vec())
            .with_header(HEADER_API_KEY, "super-secret")
            .with_header(HEADER_ARCHIVE_PASSWORD, "infected")
            .with_header(HEADER_FILENAME, "a.zip");

        let shown = format!("{:?}", request);
        assert!(!shown.contains("super-secret"));
        assert!(!shown.contains("infected"));
        assert!(shown.contains("a.zip"));
        assert!(shown.contains("body_len: Some(4)"));
    }

    #[test]
    fn test_error_for_status() {
        assert!(HttpResponse::new(200, "{}").error_for_status().is_ok());

        let err = HttpResponse::new(401, "Invalid apikey")
            .error_for_status()
            .unwrap_err();
        assert!(matches!(err, ScanError::AuthenticationFailed { .. }));

        let err = HttpResponse::new(429, "").error_for_status().unwrap_err();
        assert!(matches!(err, ScanError::RateLimited { .. }));

        let err = HttpResponse::new(500, "oops").error_for_status().unwrap_err();
        assert!(matches!(err, ScanError::ServiceError { status: 500, .. }));
    }
}
