//! Scan target abstraction.
//!
//! A [`FileInput`] is the content a [`ScanJob`](crate::job::ScanJob) uploads.
//! The job only ever reads it: paths are opened and read, bytes are copied
//! into the request body, streams are drained once and the content is kept
//! so every later read (and every clone) sees the same bytes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::io::{AsyncRead, AsyncReadExt};

use crate::core::error::ScanError;

/// Content to be scanned: a path on disk, in-memory bytes, or an async stream.
///
/// # Examples
///
/// ```rust
/// use metascan::core::FileInput;
///
/// let input = FileInput::from_path("/srv/uploads/invoice.zip");
/// assert_eq!(input.display_name(), Some("invoice.zip"));
///
/// let input = FileInput::from_bytes(vec![0x4D, 0x5A]).with_filename("setup.exe");
/// assert_eq!(input.size_hint(), Some(2));
/// ```
pub enum FileInput {
    /// A file path on disk.
    Path(PathBuf),

    /// In-memory bytes with optional filename.
    Bytes {
        /// The file data.
        data: Vec<u8>,
        /// Optional original filename.
        filename: Option<String>,
    },

    /// An async stream of bytes, buffered on first read.
    Stream {
        /// The shared stream and its buffered content.
        source: Arc<StreamSource>,
        /// Optional size hint, checked against the upload limit.
        size_hint: Option<u64>,
        /// Optional filename.
        filename: Option<String>,
    },
}

impl std::fmt::Debug for FileInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes { data, filename } => f
                .debug_struct("Bytes")
                .field("data_len", &data.len())
                .field("filename", filename)
                .finish(),
            Self::Stream {
                size_hint,
                filename,
                ..
            } => f
                .debug_struct("Stream")
                .field("size_hint", size_hint)
                .field("filename", filename)
                .finish_non_exhaustive(),
        }
    }
}

impl Clone for FileInput {
    fn clone(&self) -> Self {
        match self {
            Self::Path(path) => Self::Path(path.clone()),
            Self::Bytes { data, filename } => Self::Bytes {
                data: data.clone(),
                filename: filename.clone(),
            },
            Self::Stream {
                source,
                size_hint,
                filename,
            } => Self::Stream {
                source: Arc::clone(source),
                size_hint: *size_hint,
                filename: filename.clone(),
            },
        }
    }
}

impl FileInput {
    /// Creates a `FileInput` from a file path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Creates a `FileInput` from bytes.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes {
            data: data.into(),
            filename: None,
        }
    }

    /// Creates a `FileInput` from an async reader.
    pub fn from_stream(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::Stream {
            source: Arc::new(StreamSource::new(Box::new(reader))),
            size_hint: None,
            filename: None,
        }
    }

    /// Sets the filename for bytes or stream inputs.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        match &mut self {
            Self::Bytes { filename: f, .. } => *f = Some(filename.into()),
            Self::Stream { filename: f, .. } => *f = Some(filename.into()),
            Self::Path(_) => {} // derived from the path
        }
        self
    }

    /// Sets the size hint for stream inputs.
    pub fn with_size_hint(mut self, size: u64) -> Self {
        if let Self::Stream { size_hint, .. } = &mut self {
            *size_hint = Some(size);
        }
        self
    }

    /// Returns the name sent to the service in the `filename` header.
    ///
    /// For paths this is the final path component, never the full path.
    pub fn display_name(&self) -> Option<&str> {
        match self {
            Self::Path(path) => path.file_name().and_then(|n| n.to_str()),
            Self::Bytes { filename, .. } => filename.as_deref(),
            Self::Stream { filename, .. } => filename.as_deref(),
        }
    }

    /// Returns the size in bytes, if known without I/O.
    pub fn size_hint(&self) -> Option<u64> {
        match self {
            Self::Path(_) => None,
            Self::Bytes { data, .. } => Some(data.len() as u64),
            Self::Stream { size_hint, .. } => *size_hint,
        }
    }

    /// Returns the path, if this is a path-based input.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            _ => None,
        }
    }

    /// Returns the bytes, if this is a bytes-based input.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Reads the whole target into memory.
    pub async fn read_bytes(&self) -> Result<Vec<u8>, ScanError> {
        self.read_bytes_up_to(u64::MAX).await
    }

    /// Reads the whole target into memory, failing with
    /// [`ScanError::FileTooLarge`] as soon as it is known to exceed `max`.
    ///
    /// Paths are checked against their metadata before being read; streams
    /// stop after `max + 1` bytes. A stream that overran a limit once keeps
    /// failing, since its tail was never read.
    pub async fn read_bytes_up_to(&self, max: u64) -> Result<Vec<u8>, ScanError> {
        match self {
            Self::Path(path) => {
                let not_found = |e: std::io::Error| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        ScanError::FileNotFound {
                            path: path.display().to_string(),
                        }
                    } else {
                        ScanError::Io(e)
                    }
                };

                let size = tokio::fs::metadata(path).await.map_err(not_found)?.len();
                if size > max {
                    return Err(ScanError::FileTooLarge { size, max });
                }
                let data = tokio::fs::read(path).await.map_err(not_found)?;
                check_len(data, max)
            }
            Self::Bytes { data, .. } => check_len(data.clone(), max),
            Self::Stream { source, .. } => source.read_up_to(max).await,
        }
    }
}

fn check_len(data: Vec<u8>, max: u64) -> Result<Vec<u8>, ScanError> {
    let size = data.len() as u64;
    if size > max {
        return Err(ScanError::FileTooLarge { size, max });
    }
    Ok(data)
}

/// A stream target shared between clones of a [`FileInput`].
///
/// The reader is drained at most once. Its content is kept, so a retried
/// submission or an upload after a hash lookup sends the same bytes.
pub struct StreamSource {
    state: tokio::sync::Mutex<StreamState>,
}

enum StreamState {
    Pending(Box<dyn AsyncRead + Send + Unpin>),
    Buffered(Vec<u8>),
    /// At least `read` bytes; the rest was never read.
    Oversized { read: u64 },
    Failed,
}

impl StreamSource {
    fn new(reader: Box<dyn AsyncRead + Send + Unpin>) -> Self {
        Self {
            state: tokio::sync::Mutex::new(StreamState::Pending(reader)),
        }
    }

    async fn read_up_to(&self, max: u64) -> Result<Vec<u8>, ScanError> {
        let mut state = self.state.lock().await;

        if let StreamState::Pending(reader) = &mut *state {
            let mut data = Vec::new();
            let result = AsyncReadExt::take(&mut *reader, max.saturating_add(1))
                .read_to_end(&mut data)
                .await;

            let next = match result {
                Ok(_) if data.len() as u64 > max => StreamState::Oversized {
                    read: data.len() as u64,
                },
                Ok(_) => StreamState::Buffered(data),
                Err(e) => {
                    *state = StreamState::Failed;
                    return Err(ScanError::Io(e));
                }
            };
            *state = next;
        }

        match &*state {
            StreamState::Buffered(data) => check_len(data.clone(), max),
            StreamState::Oversized { read } => Err(ScanError::FileTooLarge { size: *read, max }),
            StreamState::Failed => Err(ScanError::Io(std::io::Error::other(
                "stream failed during an earlier read",
            ))),
            StreamState::Pending(_) => Err(ScanError::Io(std::io::Error::other(
                "stream was not read",
            ))),
        }
    }
}

impl std::fmt::Debug for StreamSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSource").finish_non_exhaustive()
    }
}

impl From<PathBuf> for FileInput {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for FileInput {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for FileInput {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<String> for FileInput {
    fn from(path: String) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<Vec<u8>> for FileInput {
    fn from(data: Vec<u8>) -> Self {
        Self::from_bytes(data)
    }
}

impl From<&[u8]> for FileInput {
    fn from(data: &[u8]) -> Self {
        Self::from_bytes(data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_display_name_is_file_name_only() {
        let input = FileInput::from_path("/var/spool/uploads/report.pdf");
        assert_eq!(input.display_name(), Some("report.pdf"));
        assert_eq!(input.as_path(), Some(Path::new("/var/spool/uploads/report.pdf")));

        let input = FileInput::from_bytes(vec![1, 2, 3]);
        assert_eq!(input.display_name(), None);
    }

    #[test]
    fn test_with_filename_ignored_for_paths() {
        let input = FileInput::from_path("/tmp/a.bin").with_filename("b.bin");
        assert_eq!(input.display_name(), Some("a.bin"));
    }

    #[tokio::test]
    async fn test_read_bytes_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"payload").unwrap();

        let input = FileInput::from_path(file.path());
        assert_eq!(input.read_bytes().await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_read_bytes_missing_path() {
        let input = FileInput::from_path("/definitely/not/here.bin");
        let err = input.read_bytes().await.unwrap_err();
        assert!(matches!(err, ScanError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_read_bytes_from_stream() {
        let input = FileInput::from_stream(futures::io::Cursor::new(b"streamed".to_vec()))
            .with_filename("s.bin")
            .with_size_hint(8);
        assert_eq!(input.size_hint(), Some(8));
        assert_eq!(input.read_bytes().await.unwrap(), b"streamed");
    }

    #[tokio::test]
    async fn test_stream_content_survives_repeated_reads_and_clones() {
        let input = FileInput::from_stream(futures::io::Cursor::new(b"MALWARE-PAYLOAD".to_vec()));
        let copy = input.clone();

        assert_eq!(input.read_bytes().await.unwrap(), b"MALWARE-PAYLOAD");
        assert_eq!(input.read_bytes().await.unwrap(), b"MALWARE-PAYLOAD");
        assert_eq!(copy.read_bytes_up_to(15).await.unwrap(), b"MALWARE-PAYLOAD");
    }

    #[tokio::test]
    async fn test_stream_read_stops_at_limit() {
        let input = FileInput::from_stream(futures::io::repeat(7).take(64 * 1024 * 1024));

        let err = input.read_bytes_up_to(4).await.unwrap_err();
        assert!(matches!(err, ScanError::FileTooLarge { size: 5, max: 4 }));

        // the tail was never read, so the stream stays unusable
        let err = input.read_bytes().await.unwrap_err();
        assert!(matches!(err, ScanError::FileTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_buffered_stream_checked_against_each_limit() {
        let input = FileInput::from_stream(futures::io::Cursor::new(vec![0u8; 10]));
        assert_eq!(input.read_bytes().await.unwrap().len(), 10);

        let err = input.read_bytes_up_to(9).await.unwrap_err();
        assert!(matches!(err, ScanError::FileTooLarge { size: 10, max: 9 }));
    }

    #[tokio::test]
    async fn test_path_checked_against_metadata() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 32]).unwrap();

        let input = FileInput::from_path(file.path());
        let err = input.read_bytes_up_to(16).await.unwrap_err();
        assert!(matches!(err, ScanError::FileTooLarge { size: 32, max: 16 }));
        assert_eq!(input.read_bytes_up_to(32).await.unwrap().len(), 32);
    }

    #[test]
    fn test_file_input_conversions() {
        let _: FileInput = PathBuf::from("/test").into();
        let _: FileInput = "/test".into();
        let _: FileInput = String::from("/test").into();
        let _: FileInput = vec![1u8, 2, 3].into();
        let _: FileInput = [1u8, 2, 3].as_slice().into();
    }
}
