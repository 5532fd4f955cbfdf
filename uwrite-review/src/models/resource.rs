//! Content resources submitted for review
//!
//! A resource is one file from the host: a readable byte stream plus the
//! declared length, MIME type and display name the eligibility check and the
//! upload rely on.

use async_trait::async_trait;
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tokio::io::AsyncRead;

/// Readable content stream handed to the upload
pub type ContentStream = Box<dyn AsyncRead + Send + Sync + Unpin>;

/// Host content item (file bytes + metadata)
#[async_trait]
pub trait ContentResource: Send + Sync + fmt::Debug {
    /// External content identifier (unique lookup key)
    fn id(&self) -> &str;

    /// Declared content length in bytes
    fn content_length(&self) -> u64;

    /// Declared MIME type
    fn content_type(&self) -> &str;

    /// Display name ("essay final.docx"), if the host set one
    fn display_name(&self) -> Option<&str>;

    /// Open a fresh read stream over the content
    async fn stream_content(&self) -> std::io::Result<ContentStream>;
}

/// Extension of a file name without the dot, lower-cased
///
/// `"dir/essay.DOCX"` → `Some("docx")`, `"README"` → `None`.
pub fn file_extension(name: &str) -> Option<String> {
    let file_name = file_name(name);
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

/// File name without directories and extension
///
/// `"dir/essay final.docx"` → `"essay final"`.
pub fn base_name(name: &str) -> &str {
    let file_name = file_name(name);
    match file_name.rsplit_once('.') {
        Some((base, _)) => base,
        None => file_name,
    }
}

fn file_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Resource backed by a file on disk
#[derive(Debug, Clone)]
pub struct FileResource {
    id: String,
    path: PathBuf,
    content_length: u64,
    content_type: String,
    display_name: Option<String>,
}

impl FileResource {
    /// Stat the file and build a resource for it
    ///
    /// The display name defaults to the file name on disk.
    pub async fn open(
        id: &str,
        path: &Path,
        content_type: &str,
        display_name: Option<&str>,
    ) -> std::io::Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Not a regular file: {}", path.display()),
            ));
        }

        let display_name = display_name.map(str::to_string).or_else(|| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
        });

        Ok(Self {
            id: id.to_string(),
            path: path.to_path_buf(),
            content_length: metadata.len(),
            content_type: content_type.to_string(),
            display_name,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ContentResource for FileResource {
    fn id(&self) -> &str {
        &self.id
    }

    fn content_length(&self) -> u64 {
        self.content_length
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    async fn stream_content(&self) -> std::io::Result<ContentStream> {
        let file = tokio::fs::File::open(&self.path).await?;
        Ok(Box::new(file))
    }
}

/// Resource held in memory
#[derive(Clone)]
pub struct MemoryResource {
    id: String,
    bytes: Vec<u8>,
    declared_length: u64,
    content_type: String,
    display_name: Option<String>,
}

impl MemoryResource {
    pub fn new(id: &str, bytes: Vec<u8>, content_type: &str, display_name: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            declared_length: bytes.len() as u64,
            bytes,
            content_type: content_type.to_string(),
            display_name: display_name.map(str::to_string),
        }
    }

    /// Override the declared length (hosts may report a length that differs
    /// from what the stream yields)
    pub fn with_declared_length(mut self, length: u64) -> Self {
        self.declared_length = length;
        self
    }
}

impl fmt::Debug for MemoryResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryResource")
            .field("id", &self.id)
            .field("declared_length", &self.declared_length)
            .field("content_type", &self.content_type)
            .field("display_name", &self.display_name)
            .finish()
    }
}

#[async_trait]
impl ContentResource for MemoryResource {
    fn id(&self) -> &str {
        &self.id
    }

    fn content_length(&self) -> u64 {
        self.declared_length
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    async fn stream_content(&self) -> std::io::Result<ContentStream> {
        Ok(Box::new(Cursor::new(self.bytes.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("essay.docx").as_deref(), Some("docx"));
        assert_eq!(file_extension("dir.v2/Essay.PDF").as_deref(), Some("pdf"));
        assert_eq!(file_extension("/group/site/README"), None);
        assert_eq!(file_extension("trailing."), None);
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("essay final.docx"), "essay final");
        assert_eq!(base_name("/group/site/notes.v2.txt"), "notes.v2");
        assert_eq!(base_name("C:\\docs\\thesis.odt"), "thesis");
        assert_eq!(base_name("README"), "README");
    }

    #[tokio::test]
    async fn test_memory_resource_streams_bytes() {
        let resource = MemoryResource::new("id-1", b"hello".to_vec(), "text/plain", Some("a.txt"));
        let mut stream = resource.stream_content().await.unwrap();
        let mut buf = String::new();
        stream.read_to_string(&mut buf).await.unwrap();

        assert_eq!(buf, "hello");
        assert_eq!(resource.content_length(), 5);
    }

    #[tokio::test]
    async fn test_file_resource_reads_metadata() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("essay.txt");
        tokio::fs::write(&path, b"twelve bytes").await.unwrap();

        let resource = FileResource::open("/attachment/essay.txt", &path, "text/plain", None)
            .await
            .unwrap();

        assert_eq!(resource.content_length(), 12);
        assert_eq!(resource.display_name(), Some("essay.txt"));
    }

    #[tokio::test]
    async fn test_file_resource_missing_file() {
        let result = FileResource::open("x", Path::new("/nonexistent/file.txt"), "text/plain", None).await;
        assert!(result.is_err());
    }
}
