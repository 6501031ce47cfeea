//! HTTPS transport backed by `reqwest`.
//!
//! Connection pooling and TLS are reqwest's; this type only translates
//! between [`HttpRequest`]/[`HttpResponse`] and reqwest's types and maps
//! transport failures onto [`ScanError`].

use crate::core::{HttpRequest, HttpResponse, Method, ScanError, Transport};

use async_trait::async_trait;
use std::time::Duration;

/// Transport sending requests with a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("metascan-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScanError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// Wraps an existing client, e.g. one configured with a proxy.
    pub fn from_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ScanError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ScanError::timeout(format!("{} {}", method, url), self.timeout)
            } else {
                ScanError::connection_failed(&url, e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ScanError::connection_failed(&url, e.to_string()))?;

        tracing::trace!(method = %method, url = %url, status, body_len = body.len(), "HTTP response");

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
