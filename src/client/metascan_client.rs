//! The client value shared by scan jobs.

use crate::client::config::{ClientConfig, Endpoints};
use crate::core::traits::HEADER_API_KEY;
use crate::core::{
    FileHasher, FileInput, HttpRequest, HttpResponse, ScanError, ScanSnapshot, Transport,
};
use crate::job::ScanJob;

use secrecy::ExposeSecret;
use serde_json::Value;
use std::sync::Arc;

/// Credentials, endpoints and a transport.
///
/// Cloning is cheap; clones share the transport, so one client can back
/// any number of concurrently running jobs.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Creates a client using the built-in HTTPS transport.
    #[cfg(feature = "http")]
    pub fn new(config: ClientConfig) -> Result<Self, ScanError> {
        let transport = crate::transport::ReqwestTransport::new(config.timeout)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Creates a client from the environment (see [`ClientConfig::from_env`]).
    #[cfg(feature = "http")]
    pub fn from_env() -> Result<Self, ScanError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Creates a client sending requests through `transport`.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            transport,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the endpoint set.
    pub fn endpoints(&self) -> &Endpoints {
        &self.config.endpoints
    }

    /// Starts a scan job for `target`. No request is sent until
    /// [`ScanJob::submit`] is awaited.
    pub fn scan(&self, target: impl Into<FileInput>) -> ScanJob {
        ScanJob::new(self.clone(), target)
    }

    pub(crate) fn api_key(&self) -> &str {
        self.config.api_key.expose_secret()
    }

    pub(crate) async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ScanError> {
        tracing::debug!(method = %request.method, url = %request.url, "Sending request");
        self.transport.send(request).await
    }

    /// Looks up a previous scan of a file by its hash.
    ///
    /// Returns `Ok(None)` if the service has never seen the file.
    pub async fn lookup_hash(&self, hash: &str) -> Result<Option<ScanSnapshot>, ScanError> {
        let url = self.config.endpoints.hash_url(hash);
        let request = HttpRequest::get(&url).with_header(HEADER_API_KEY, self.api_key());

        let response = self.send(request).await?;
        if response.status == 404 {
            return Ok(None);
        }

        let response = response.error_for_status()?;
        let snapshot = ScanSnapshot::from_slice(&url, &response.body)?;

        if is_not_found(snapshot.as_value(), hash) {
            tracing::debug!(hash = %hash, "Hash not known to service");
            return Ok(None);
        }

        Ok(Some(snapshot))
    }

    /// Hashes `input` with SHA-256 and looks it up.
    pub async fn lookup_file(&self, input: &FileInput) -> Result<Option<ScanSnapshot>, ScanError> {
        let hash = FileHasher::new().hash_input(input).await?;
        self.lookup_hash(&hash.sha256).await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoints", &self.config.endpoints)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

/// The lookup endpoint answers unknown hashes with `{"<hash>": "Not Found"}`.
fn is_not_found(body: &Value, hash: &str) -> bool {
    body.as_object()
        .filter(|map| map.len() == 1)
        .and_then(|map| map.iter().next())
        .map(|(key, value)| {
            key.eq_ignore_ascii_case(hash)
                && value
                    .as_str()
                    .is_some_and(|v| v.eq_ignore_ascii_case("not found"))
        })
        .unwrap_or(false)
}
