//! # Metascan
//!
//! An async client for the Metascan multi-engine malware-scanning service.
//!
//! ## Overview
//!
//! Scanning on the service is asynchronous. Uploading a file returns a
//! tracking identifier (`data_id`); the verdict has to be fetched separately
//! once enough engines have finished. This crate models one such scan as a
//! [`ScanJob`]:
//!
//! - Submit a file (path, bytes or async stream), optionally a password
//!   protected archive
//! - Poll for results on demand, with an explicit refresh policy
//! - Read a clean/infected verdict from the cached result
//! - Look up earlier scans by file hash without uploading
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use metascan::{Client, ClientConfig, PollConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(ClientConfig::from_env()?)?;
//!
//!     let mut job = client.scan("/srv/uploads/invoice.pdf");
//!     let data_id = job.submit().await?;
//!     println!("submitted as {data_id}");
//!
//!     job.wait_for_completion(&PollConfig::default()).await?;
//!     if job.is_clean(false).await? {
//!         println!("File is clean!");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `default` - Includes the `http` transport
//! - `http` - HTTPS transport via `reqwest`, plus [`Client::new`]
//!
//! ## Architecture
//!
//! - **Core**: Snapshot and verdict types, the `Transport` trait, errors
//! - **Client**: Credentials, endpoints, hash lookups, job creation
//! - **Job**: The submit/poll protocol and its refresh policy
//! - **Transport**: `reqwest` and mock implementations
//!
//! Retries, rate limiting and batching many jobs are left to the caller.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod client;
pub mod core;
pub mod job;
pub mod transport;

// Re-export commonly used types at the crate root
pub use crate::client::{Client, ClientConfig, Endpoints};
pub use crate::core::{
    FileHash, FileHasher, FileInput, HttpRequest, HttpResponse, Method, Refresh, ScanError,
    ScanSnapshot, ScanSummary, Transport, Verdict,
};
pub use crate::job::{PollConfig, ScanJob};

/// Prelude module for convenient imports.
///
/// ```rust
/// use metascan::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::{Client, ClientConfig, Endpoints};
    pub use crate::core::{
        FileInput, Refresh, ScanError, ScanSnapshot, Transport, Verdict,
    };
    pub use crate::job::{PollConfig, ScanJob};
}
