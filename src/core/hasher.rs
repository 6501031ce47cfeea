//! File hashing for hash lookups.
//!
//! The service indexes previously scanned files by SHA-256 (and accepts MD5
//! for legacy callers), so a file can be checked without uploading it.

use crate::core::error::ScanError;
use crate::core::input::FileInput;
use crate::core::types::FileHash;

use md5::Md5;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Computes the hashes the lookup endpoint understands.
///
/// SHA-256 is always computed. MD5 is opt-in.
///
/// ```rust
/// use metascan::core::FileHasher;
///
/// let hash = FileHasher::new().hash_bytes(b"hello world");
/// assert_eq!(
///     hash.sha256,
///     "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileHasher {
    compute_md5: bool,
}

impl FileHasher {
    /// Creates a new `FileHasher` computing SHA-256 only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables MD5 hash computation.
    pub fn with_md5(mut self, enabled: bool) -> Self {
        self.compute_md5 = enabled;
        self
    }

    /// Returns whether MD5 computation is enabled.
    pub fn computes_md5(&self) -> bool {
        self.compute_md5
    }

    /// Computes hashes from bytes already in memory.
    pub fn hash_bytes(&self, data: &[u8]) -> FileHash {
        let sha256 = format!("{:x}", Sha256::digest(data));
        let md5 = self.compute_md5.then(|| format!("{:x}", Md5::digest(data)));
        FileHash { sha256, md5 }
    }

    /// Computes hashes from a synchronous reader in a single pass.
    pub fn hash_reader<R: Read>(&self, reader: &mut R) -> Result<FileHash, ScanError> {
        let mut sha256 = Sha256::new();
        let mut md5 = self.compute_md5.then(Md5::new);

        let mut buffer = [0u8; 64 * 1024];
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            let chunk = &buffer[..bytes_read];
            sha256.update(chunk);
            if let Some(ref mut h) = md5 {
                h.update(chunk);
            }
        }

        Ok(FileHash {
            sha256: format!("{:x}", sha256.finalize()),
            md5: md5.map(|h| format!("{:x}", h.finalize())),
        })
    }

    /// Computes hashes from a file path, streaming the file.
    pub fn hash_file(&self, path: &Path) -> Result<FileHash, ScanError> {
        let file = std::fs::File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScanError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ScanError::Io(e)
            }
        })?;

        let mut reader = std::io::BufReader::new(file);
        self.hash_reader(&mut reader)
    }

    /// Computes hashes from any `FileInput`.
    ///
    /// Stream inputs are buffered, so they can still be uploaded afterwards.
    pub async fn hash_input(&self, input: &FileInput) -> Result<FileHash, ScanError> {
        match input {
            FileInput::Bytes { data, .. } => Ok(self.hash_bytes(data)),
            other => {
                let data = other.read_bytes().await?;
                Ok(self.hash_bytes(&data))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_bytes_sha256_only() {
        let hash = FileHasher::new().hash_bytes(b"hello world");
        assert_eq!(
            hash.sha256,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(hash.md5, None);
    }

    #[test]
    fn test_hash_bytes_with_md5() {
        let hash = FileHasher::new().with_md5(true).hash_bytes(b"hello world");
        assert_eq!(hash.md5.as_deref(), Some("5eb63bbbe01eeed093cb22bb8f5acdc3"));
    }

    #[test]
    fn test_reader_matches_bytes() {
        let hasher = FileHasher::new().with_md5(true);
        let data = vec![7u8; 200 * 1024];

        let streamed = hasher.hash_reader(&mut data.as_slice()).unwrap();
        assert_eq!(streamed, hasher.hash_bytes(&data));
    }

    #[test]
    fn test_hash_missing_file() {
        let err = FileHasher::new()
            .hash_file(Path::new("/no/such/file"))
            .unwrap_err();
        assert!(matches!(err, ScanError::FileNotFound { .. }));
    }
}
