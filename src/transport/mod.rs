//! Transport implementations.
//!
//! - [`mock`] - A scripted in-memory transport for tests
//! - [`http`] - `reqwest`-backed HTTPS transport (requires `http` feature)
//!
//! ## Implementing a Custom Transport
//!
//! ```rust,ignore
//! use metascan::core::{HttpRequest, HttpResponse, ScanError, Transport};
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! pub struct ProxiedTransport {
//!     // connection pool, proxy settings, ...
//! }
//!
//! #[async_trait]
//! impl Transport for ProxiedTransport {
//!     async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ScanError> {
//!         todo!()
//!     }
//! }
//! ```

pub mod mock;

#[cfg(feature = "http")]
pub mod http;

pub use mock::MockTransport;

#[cfg(feature = "http")]
pub use http::ReqwestTransport;
