//! Client configuration.

use crate::core::ScanError;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "METASCAN_API_KEY";
/// Environment variable overriding the service base URL.
pub const ENV_BASE_URL: &str = "METASCAN_BASE_URL";

/// The three service endpoints.
///
/// There is exactly one authoritative set per client. [`Endpoints::default`]
/// is the v2 API; [`Endpoints::v1`] is the legacy one, for deployments that
/// still point at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// `POST` target for file submission.
    pub scan_file: String,
    /// Base for results by tracking identifier.
    pub results_by_data_id: String,
    /// Base for lookups by file hash.
    pub results_by_file_hash: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            scan_file: "https://scan.metascan-online.com/v2/file".to_string(),
            results_by_data_id: "https://scan.metascan-online.com/v2/file".to_string(),
            results_by_file_hash: "https://hashlookup.metascan-online.com/v2/hash".to_string(),
        }
    }
}

impl Endpoints {
    /// The legacy v1 endpoint set.
    pub fn v1() -> Self {
        Self {
            scan_file: "https://api.metascan-online.com/v1/file".to_string(),
            results_by_data_id: "https://api.metascan-online.com/v1/file".to_string(),
            results_by_file_hash: "https://api.metascan-online.com/v1/hash".to_string(),
        }
    }

    /// Points every endpoint at one base URL, e.g. an on-premise instance
    /// or a test server: `{base}/file` and `{base}/hash`.
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            scan_file: format!("{}/file", base),
            results_by_data_id: format!("{}/file", base),
            results_by_file_hash: format!("{}/hash", base),
        }
    }

    /// URL for the results of one scan.
    pub fn results_url(&self, data_id: &str) -> String {
        join_url(&self.results_by_data_id, data_id)
    }

    /// URL for a hash lookup.
    pub fn hash_url(&self, hash: &str) -> String {
        join_url(&self.results_by_file_hash, hash)
    }
}

/// Joins with exactly one `/`, whatever the base ends with.
fn join_url(base: &str, segment: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        segment.trim_start_matches('/')
    )
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key (kept secret).
    pub api_key: SecretString,

    /// Service endpoints.
    pub endpoints: Endpoints,

    /// Per-request timeout for the built-in HTTP transport.
    pub timeout: Duration,

    /// Maximum file size to upload.
    pub max_file_size: u64,
}

impl ClientConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        let api_key: String = api_key.into();
        Self {
            api_key: SecretString::from(api_key),
            endpoints: Endpoints::default(),
            timeout: Duration::from_secs(60),
            max_file_size: 140 * 1024 * 1024, // 140 MB public API limit
        }
    }

    /// Reads `METASCAN_API_KEY` and, if set, `METASCAN_BASE_URL`.
    pub fn from_env() -> Result<Self, ScanError> {
        let api_key = std::env::var(ENV_API_KEY)
            .map_err(|_| ScanError::configuration(format!("{} is not set", ENV_API_KEY)))?;
        let mut config = Self::new(api_key);

        if let Ok(base) = std::env::var(ENV_BASE_URL) {
            config.endpoints = Endpoints::with_base_url(&base);
        }

        config.validate()?;
        Ok(config)
    }

    /// Sets the endpoints.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum file size.
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Rejects configurations that cannot produce a valid request.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(ScanError::configuration("API key is empty"));
        }

        for (name, url) in [
            ("scan_file", &self.endpoints.scan_file),
            ("results_by_data_id", &self.endpoints.results_by_data_id),
            ("results_by_file_hash", &self.endpoints.results_by_file_hash),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ScanError::configuration(format!(
                    "endpoint {} is not an http(s) URL: {}",
                    name, url
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("test-key")
            .with_max_file_size(1024)
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.max_file_size, 1024);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.api_key.expose_secret(), "test-key");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = ClientConfig::new("super-secret");
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[test]
    fn test_validate_rejects_empty_key() {
        let err = ClientConfig::new("  ").validate().unwrap_err();
        assert!(matches!(err, ScanError::Configuration { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let config = ClientConfig::new("k").with_endpoints(Endpoints::with_base_url("ftp://x"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_results_url_joins_with_single_slash() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.results_url("abc123"),
            "https://scan.metascan-online.com/v2/file/abc123"
        );

        let endpoints = Endpoints {
            results_by_data_id: "https://example.test/v1/file/".to_string(),
            ..Endpoints::v1()
        };
        assert_eq!(endpoints.results_url("abc123"), "https://example.test/v1/file/abc123");
    }

    #[test]
    fn test_with_base_url() {
        let endpoints = Endpoints::with_base_url("http://127.0.0.1:8008/v2/");
        assert_eq!(endpoints.scan_file, "http://127.0.0.1:8008/v2/file");
        assert_eq!(
            endpoints.hash_url("deadbeef"),
            "http://127.0.0.1:8008/v2/hash/deadbeef"
        );
    }
}
