//! Error types for the metascan client.
//!
//! Every failure a scan job can hit is one of four kinds: the transport
//! failed, the service answered with something we cannot read, the service
//! refused the request, or the caller used the job out of order. They are
//! kept distinct so callers never mistake a failure for a verdict.

use std::time::Duration;
use thiserror::Error;

/// The main error type for scan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The request never produced a response (refused, reset, TLS failure).
    #[error("connection to '{endpoint}' failed: {message}")]
    ConnectionFailed {
        /// URL the request was addressed to.
        endpoint: String,
        /// Error message describing the failure.
        message: String,
    },

    /// An operation did not finish in time.
    #[error("{operation} timed out after {elapsed:?}")]
    Timeout {
        /// What was being waited for.
        operation: String,
        /// How long the operation ran before giving up.
        elapsed: Duration,
    },

    /// [`ScanJob::wait_for_completion`](crate::job::ScanJob::wait_for_completion)
    /// ran out of time before the scan completed. The remote scan goes on.
    #[error("scan {data_id:?} still incomplete after {elapsed:?} (progress {progress:?})")]
    PollDeadlineExceeded {
        /// Tracking identifier of the scan, if one was bound.
        data_id: Option<String>,
        /// Progress reported by the last snapshot.
        progress: Option<i64>,
        /// Time spent waiting.
        elapsed: Duration,
    },

    /// The service answered, but not in the wire format we expect.
    #[error("protocol violation from '{endpoint}': {details}")]
    ProtocolViolation {
        /// URL (or logical source) of the offending response.
        endpoint: String,
        /// What was wrong with it.
        details: String,
    },

    /// Results were requested before the job was submitted.
    #[error("scan job has not been submitted; no data_id to query")]
    NotSubmitted,

    /// The job already maps to a remote scan.
    #[error("scan job was already submitted as data_id '{data_id}'")]
    AlreadySubmitted {
        /// The tracking identifier bound on the first submission.
        data_id: String,
    },

    /// The service answered with a non-success status.
    #[error("service returned HTTP {status}: {message}")]
    ServiceError {
        /// HTTP status code.
        status: u16,
        /// Response body or reason, truncated.
        message: String,
    },

    /// The API key was rejected.
    #[error("authentication failed: {reason}")]
    AuthenticationFailed {
        /// Reason for authentication failure.
        reason: String,
    },

    /// Rate limit exceeded.
    #[error("rate limit exceeded: retry after {retry_after:?}")]
    RateLimited {
        /// Suggested wait time before retry, when the service sent one.
        retry_after: Option<Duration>,
    },

    /// The target exceeds the maximum upload size.
    #[error("file size {size} bytes exceeds maximum {max} bytes")]
    FileTooLarge {
        /// Actual file size in bytes.
        size: u64,
        /// Maximum allowed size in bytes.
        max: u64,
    },

    /// File not found at the specified path.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: String,
    },

    /// An I/O error occurred while reading the target.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl ScanError {
    /// Returns `true` if repeating the same request later might succeed.
    ///
    /// The client itself never retries; this is a hint for whoever drives it.
    /// A [`PollDeadlineExceeded`](Self::PollDeadlineExceeded) is not a failed
    /// request and does not count.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::ConnectionFailed { .. } | Self::RateLimited { .. }
        ) || matches!(self, Self::ServiceError { status, .. } if *status >= 500)
    }

    /// Returns `true` if the job was driven out of order and no request was sent.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::NotSubmitted | Self::AlreadySubmitted { .. })
    }

    /// Returns `true` if the service sent a response we could not interpret.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::ProtocolViolation { .. })
    }

    /// Creates a `ConnectionFailed` error.
    pub fn connection_failed(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(operation: impl Into<String>, elapsed: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed,
        }
    }

    /// Creates a `ProtocolViolation` error.
    pub fn protocol_violation(endpoint: impl Into<String>, details: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            endpoint: endpoint.into(),
            details: details.into(),
        }
    }

    /// Creates a `ServiceError` error.
    pub fn service_error(status: u16, message: impl Into<String>) -> Self {
        Self::ServiceError {
            status,
            message: message.into(),
        }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// A specialized `Result` type for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_is_recoverable() {
        let timeout = ScanError::timeout("results fetch", Duration::from_secs(30));
        assert!(timeout.is_recoverable());

        assert!(ScanError::service_error(503, "maintenance").is_recoverable());
        assert!(!ScanError::service_error(400, "bad request").is_recoverable());

        let deadline = ScanError::PollDeadlineExceeded {
            data_id: Some("abc123".to_string()),
            progress: Some(40),
            elapsed: Duration::from_secs(300),
        };
        assert!(!deadline.is_recoverable());
        assert!(!matches!(deadline, ScanError::Timeout { .. }));

        let malformed = ScanError::protocol_violation("https://example.test", "not json");
        assert!(!malformed.is_recoverable());
        assert!(malformed.is_protocol_violation());
    }

    #[test]
    fn test_usage_errors_are_distinct() {
        assert!(ScanError::NotSubmitted.is_usage_error());
        assert!(ScanError::AlreadySubmitted {
            data_id: "abc".into()
        }
        .is_usage_error());
        assert!(!ScanError::connection_failed("x", "refused").is_usage_error());
    }

    #[test]
    fn test_scan_error_display() {
        let err = ScanError::FileTooLarge {
            size: 200_000_000,
            max: 140_000_000,
        };
        assert!(err.to_string().contains("200000000"));
        assert!(err.to_string().contains("140000000"));

        let err = ScanError::AlreadySubmitted {
            data_id: "abc123".into(),
        };
        assert!(err.to_string().contains("abc123"));
    }
}
