//! Document references and the sources that resolve them to bytes.
//!
//! A [`DocumentRef`] names one merge input: a filesystem path, a URL or an
//! in-memory buffer, together with the format the caller declares for it.
//! Fetching bytes for paths and URLs is delegated to a [`DocumentSource`];
//! transport concerns (retries, auth, remote protocols) live behind that
//! trait and never leak into the merge engine.

use async_trait::async_trait;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Paginated format declared for a document reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    /// Portable Document Format, the only format the merge engine loads.
    #[default]
    Pdf,
    /// Anything else, named by its extension or MIME subtype.
    Other(String),
}

impl DocumentFormat {
    /// Guess the format from a file extension (case-insensitive).
    pub fn from_extension(extension: &str) -> Self {
        if extension.eq_ignore_ascii_case("pdf") {
            Self::Pdf
        } else {
            Self::Other(extension.to_ascii_lowercase())
        }
    }

    /// Whether documents of this format can be loaded.
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Pdf)
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => f.write_str("pdf"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Where the bytes of a document come from.
#[derive(Clone, PartialEq, Eq)]
pub enum DocumentLocation {
    /// A file on the local filesystem.
    Path(PathBuf),
    /// A URL resolved by the configured [`DocumentSource`].
    Url(String),
    /// Bytes already held in memory.
    Bytes(Arc<[u8]>),
}

impl fmt::Debug for DocumentLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
            Self::Bytes(data) => write!(f, "Bytes({} bytes)", data.len()),
        }
    }
}

/// Immutable reference to one merge input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    location: DocumentLocation,
    name: String,
    format: DocumentFormat,
}

impl DocumentRef {
    /// Reference a file on disk. The format is guessed from the extension,
    /// defaulting to PDF when there is none.
    pub fn path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = path
            .extension()
            .map(|ext| DocumentFormat::from_extension(&ext.to_string_lossy()))
            .unwrap_or_default();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            location: DocumentLocation::Path(path),
            name,
            format,
        }
    }

    /// Reference a document by URL, declared as PDF.
    pub fn url(url: impl Into<String>) -> Self {
        let url = url.into();
        let name = url
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(url.as_str())
            .to_string();

        Self {
            location: DocumentLocation::Url(url),
            name,
            format: DocumentFormat::Pdf,
        }
    }

    /// Reference an in-memory buffer, declared as PDF.
    pub fn bytes(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            location: DocumentLocation::Bytes(data.into()),
            name: name.into(),
            format: DocumentFormat::Pdf,
        }
    }

    /// Override the declared format.
    pub fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = format;
        self
    }

    /// Where the bytes come from.
    pub fn location(&self) -> &DocumentLocation {
        &self.location
    }

    /// Short human-readable name (file name, last URL segment, or the given name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared format.
    pub fn format(&self) -> &DocumentFormat {
        &self.format
    }
}

/// Resolves document locations into raw bytes.
///
/// Implementations own all transport concerns. Failures are reported as
/// opaque I/O errors and are never retried by the merge engine.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch the full byte content at `location`.
    async fn fetch(&self, location: &DocumentLocation) -> io::Result<Vec<u8>>;
}

/// Source backed by the local filesystem.
///
/// Accepts plain paths and `file://` URLs. Other URL schemes are rejected
/// with [`io::ErrorKind::Unsupported`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl FsSource {
    /// Create a filesystem source.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentSource for FsSource {
    async fn fetch(&self, location: &DocumentLocation) -> io::Result<Vec<u8>> {
        match location {
            DocumentLocation::Path(path) => tokio::fs::read(path).await,
            DocumentLocation::Url(url) => match url.strip_prefix("file://") {
                Some(path) => tokio::fs::read(path).await,
                None => Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("no transport configured for {url}"),
                )),
            },
            DocumentLocation::Bytes(data) => Ok(data.to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_ref_infers_format_and_name() {
        let doc = DocumentRef::path("/docs/Report.PDF");
        assert_eq!(doc.name(), "Report.PDF");
        assert_eq!(doc.format(), &DocumentFormat::Pdf);

        let doc = DocumentRef::path("notes.docx");
        assert_eq!(doc.format(), &DocumentFormat::Other("docx".into()));
        assert!(!doc.format().is_supported());
    }

    #[test]
    fn test_url_ref_name_is_last_segment() {
        let doc = DocumentRef::url("https://files.example/agency/Game.pdf");
        assert_eq!(doc.name(), "Game.pdf");
        assert_eq!(doc.format(), &DocumentFormat::Pdf);
    }

    #[test]
    fn test_bytes_debug_hides_content() {
        let doc = DocumentRef::bytes("inline.pdf", vec![1u8, 2, 3]);
        let debug = format!("{:?}", doc.location());
        assert_eq!(debug, "Bytes(3 bytes)");
    }

    #[tokio::test]
    async fn test_fs_source_reads_paths_and_file_urls() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.pdf");
        std::fs::write(&path, b"%PDF-1.5").unwrap();

        let source = FsSource::new();
        let bytes = source
            .fetch(&DocumentLocation::Path(path.clone()))
            .await
            .unwrap();
        assert_eq!(bytes, b"%PDF-1.5");

        let url = format!("file://{}", path.display());
        let bytes = source.fetch(&DocumentLocation::Url(url)).await.unwrap();
        assert_eq!(bytes, b"%PDF-1.5");
    }

    #[tokio::test]
    async fn test_fs_source_rejects_remote_urls() {
        let err = FsSource::new()
            .fetch(&DocumentLocation::Url("https://example.com/a.pdf".into()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }
}
