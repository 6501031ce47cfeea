//! Wire-level result types.
//!
//! The service reports a scan as a JSON document whose `scan_results`
//! object carries a progress percentage and, once finished, an aggregate
//! threat count. [`ScanSnapshot`] keeps that document verbatim and exposes
//! the handful of fields the polling policy depends on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::core::error::ScanError;

/// Progress value at which a scan is considered finished.
pub const COMPLETE_PROGRESS: i64 = 100;

/// How [`ScanJob::results`](crate::job::ScanJob::results) decides whether to hit the network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Refresh {
    /// Fetch only when there is no snapshot yet or the cached one is incomplete.
    #[default]
    IfIncomplete,
    /// Always fetch once before returning.
    Force,
}

impl From<bool> for Refresh {
    fn from(force: bool) -> Self {
        if force {
            Self::Force
        } else {
            Self::IfIncomplete
        }
    }
}

/// The full result document of the most recent results fetch.
///
/// Equality is structural over the parsed JSON, so a snapshot compares
/// equal to the response body it was parsed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanSnapshot(Value);

impl ScanSnapshot {
    /// Wraps an already-parsed document.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Parses a response body. Non-JSON bodies are a protocol violation.
    pub fn from_slice(endpoint: &str, body: &[u8]) -> Result<Self, ScanError> {
        serde_json::from_slice(body)
            .map(Self)
            .map_err(|e| ScanError::protocol_violation(endpoint, format!("invalid JSON: {}", e)))
    }

    /// Returns the raw document.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the snapshot, returning the raw document.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Returns the `scan_results` object, if present.
    pub fn scan_results(&self) -> Option<&Map<String, Value>> {
        self.0.get("scan_results").and_then(Value::as_object)
    }

    /// Returns `scan_results.progress_percentage`, if it is an integer.
    pub fn progress(&self) -> Option<i64> {
        self.scan_results()?
            .get("progress_percentage")
            .and_then(Value::as_i64)
    }

    /// Returns `scan_results.scan_all_result_i`, if it is an integer.
    pub fn threat_count(&self) -> Option<i64> {
        self.scan_results()?
            .get("scan_all_result_i")
            .and_then(Value::as_i64)
    }

    /// Returns the tracking identifier echoed in the document, if any.
    pub fn data_id(&self) -> Option<&str> {
        self.0.get("data_id").and_then(Value::as_str)
    }

    /// Returns `true` iff progress is exactly 100.
    ///
    /// Fails when the document has no integer progress, since completeness
    /// cannot be judged without it.
    pub fn is_complete(&self) -> Result<bool, ScanError> {
        self.progress()
            .map(|p| p == COMPLETE_PROGRESS)
            .ok_or_else(|| {
                ScanError::protocol_violation(
                    "snapshot",
                    "missing scan_results.progress_percentage",
                )
            })
    }

    /// Returns `true` iff the aggregate threat count is exactly zero.
    ///
    /// A missing or non-integer count is not clean.
    pub fn is_clean(&self) -> bool {
        self.threat_count() == Some(0)
    }

    /// Classifies the snapshot.
    pub fn verdict(&self) -> Verdict {
        match self.progress() {
            None => Verdict::Indeterminate,
            Some(p) if p != COMPLETE_PROGRESS => Verdict::Pending { progress: p },
            Some(_) => match self.threat_count() {
                Some(0) => Verdict::Clean,
                Some(n) => Verdict::Infected { threat_count: n },
                None => Verdict::Indeterminate,
            },
        }
    }

    /// Deserializes `scan_results` into a typed summary.
    pub fn summary(&self) -> Result<ScanSummary, ScanError> {
        let results = self
            .0
            .get("scan_results")
            .ok_or_else(|| ScanError::protocol_violation("snapshot", "missing scan_results"))?;
        ScanSummary::deserialize(results)
            .map_err(|e| ScanError::protocol_violation("snapshot", e.to_string()))
    }
}

impl From<Value> for ScanSnapshot {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Typed view of the `scan_results` object.
///
/// Fields the client does not interpret are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Percentage of engines that have finished, 0 to 100.
    pub progress_percentage: i64,

    /// Aggregate result code; 0 means no threat found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_all_result_i: Option<i64>,

    /// Human-readable form of the aggregate result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_all_result_a: Option<String>,

    /// Number of engines the file was sent to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_avs: Option<u32>,

    /// Number of engines that flagged the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_detected_avs: Option<u32>,

    /// Service-specific diagnostic fields, passed through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Interpretation of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Verdict {
    /// The scan is still running.
    Pending {
        /// Reported progress percentage.
        progress: i64,
    },
    /// Complete, with zero threats.
    Clean,
    /// Complete, with a nonzero aggregate result.
    Infected {
        /// The aggregate result code reported by the service.
        threat_count: i64,
    },
    /// The document lacks the fields needed to decide.
    Indeterminate,
}

impl Verdict {
    /// Returns `true` for [`Verdict::Clean`].
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }

    /// Returns `true` for [`Verdict::Infected`].
    pub fn is_infected(&self) -> bool {
        matches!(self, Self::Infected { .. })
    }

    /// Returns `true` if the file should not be trusted yet.
    pub fn should_block(&self) -> bool {
        !self.is_clean()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending { progress } => write!(f, "pending ({}%)", progress),
            Self::Clean => write!(f, "clean"),
            Self::Infected { threat_count } => write!(f, "infected ({})", threat_count),
            Self::Indeterminate => write!(f, "indeterminate"),
        }
    }
}

/// Hashes of a file, as accepted by the hash lookup endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileHash {
    /// SHA-256, lowercase hex.
    pub sha256: String,

    /// MD5, lowercase hex, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
}

impl FileHash {
    /// Creates a new `FileHash` from a SHA-256 digest.
    pub fn new(sha256: impl Into<String>) -> Self {
        Self {
            sha256: sha256.into(),
            md5: None,
        }
    }

    /// Sets the MD5 hash.
    pub fn with_md5(mut self, md5: impl Into<String>) -> Self {
        self.md5 = Some(md5.into());
        self
    }
}

impl fmt::Display for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.sha256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_refresh_from_bool() {
        assert_eq!(Refresh::from(true), Refresh::Force);
        assert_eq!(Refresh::from(false), Refresh::IfIncomplete);
        assert_eq!(Refresh::default(), Refresh::IfIncomplete);
    }

    #[test]
    fn test_snapshot_equals_parsed_body() {
        let body = br#"{"scan_results":{"progress_percentage":40,"start_time":"2014-01-01"}}"#;
        let snapshot = ScanSnapshot::from_slice("test", body).unwrap();
        assert_eq!(
            snapshot,
            ScanSnapshot::new(json!({
                "scan_results": {"progress_percentage": 40, "start_time": "2014-01-01"}
            }))
        );
    }

    #[test]
    fn test_snapshot_rejects_non_json() {
        let err = ScanSnapshot::from_slice("test", b"<html>").unwrap_err();
        assert!(err.is_protocol_violation());
    }

    #[test]
    fn test_completion_is_strict_equality() {
        let done = ScanSnapshot::new(json!({"scan_results": {"progress_percentage": 100}}));
        assert!(done.is_complete().unwrap());

        let running = ScanSnapshot::new(json!({"scan_results": {"progress_percentage": 99}}));
        assert!(!running.is_complete().unwrap());

        let overshoot = ScanSnapshot::new(json!({"scan_results": {"progress_percentage": 101}}));
        assert!(!overshoot.is_complete().unwrap());

        let missing = ScanSnapshot::new(json!({"scan_results": {}}));
        assert!(missing.is_complete().unwrap_err().is_protocol_violation());
    }

    #[test]
    fn test_is_clean_requires_zero() {
        let clean = ScanSnapshot::new(json!({"scan_results": {"scan_all_result_i": 0}}));
        assert!(clean.is_clean());

        let infected = ScanSnapshot::new(json!({"scan_results": {"scan_all_result_i": 1}}));
        assert!(!infected.is_clean());

        let missing = ScanSnapshot::new(json!({"scan_results": {"progress_percentage": 100}}));
        assert!(!missing.is_clean());

        let wrong_type = ScanSnapshot::new(json!({"scan_results": {"scan_all_result_i": "0"}}));
        assert!(!wrong_type.is_clean());
    }

    #[test]
    fn test_verdict_classification() {
        let pending = ScanSnapshot::new(json!({"scan_results": {"progress_percentage": 40}}));
        assert_eq!(pending.verdict(), Verdict::Pending { progress: 40 });

        let infected = ScanSnapshot::new(json!({
            "scan_results": {"progress_percentage": 100, "scan_all_result_i": 2}
        }));
        assert_eq!(infected.verdict(), Verdict::Infected { threat_count: 2 });
        assert!(infected.verdict().should_block());

        let no_count = ScanSnapshot::new(json!({"scan_results": {"progress_percentage": 100}}));
        assert_eq!(no_count.verdict(), Verdict::Indeterminate);

        assert_eq!(ScanSnapshot::new(json!({})).verdict(), Verdict::Indeterminate);
    }

    #[test]
    fn test_summary_keeps_unknown_fields() {
        let snapshot = ScanSnapshot::new(json!({
            "data_id": "abc123",
            "scan_results": {
                "progress_percentage": 100,
                "scan_all_result_i": 0,
                "scan_all_result_a": "No threat detected",
                "total_avs": 42,
                "total_time": 1544
            }
        }));

        assert_eq!(snapshot.data_id(), Some("abc123"));
        let summary = snapshot.summary().unwrap();
        assert_eq!(summary.total_avs, Some(42));
        assert_eq!(summary.scan_all_result_a.as_deref(), Some("No threat detected"));
        assert_eq!(summary.extra.get("total_time"), Some(&json!(1544)));
    }

    #[test]
    fn test_file_hash_display() {
        let hash = FileHash::new("abc123").with_md5("def456");
        assert_eq!(format!("{}", hash), "sha256:abc123");
    }
}
