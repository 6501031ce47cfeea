//! Core types and traits for the metascan client.
//!
//! - [`types`] - `ScanSnapshot`, `Verdict`, `Refresh`, `FileHash`
//! - [`traits`] - The `Transport` trait and request/response values
//! - [`error`] - Structured error types
//! - [`input`] - Scan target abstraction
//! - [`hasher`] - SHA-256/MD5 hashing for hash lookups

pub mod error;
pub mod hasher;
pub mod input;
pub mod traits;
pub mod types;

pub use error::{ScanError, ScanResult};
pub use hasher::FileHasher;
pub use input::{FileInput, StreamSource};
pub use traits::{HttpRequest, HttpResponse, Method, Transport};
pub use types::{FileHash, Refresh, ScanSnapshot, ScanSummary, Verdict};
