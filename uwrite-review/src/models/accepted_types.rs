//! Accepted file types and the eligibility check
//!
//! Tables are built once at startup and shared read-only; nothing mutates
//! them afterwards.

use std::collections::{BTreeMap, BTreeSet};

use super::resource::{file_extension, ContentResource};

/// Default maximum accepted file size (20 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

const EXTENSION_MIME_TYPES: &[(&str, &[&str])] = &[
    (
        ".docx",
        &[
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/zip",
        ],
    ),
    (".odt", &["application/vnd.oasis.opendocument.text"]),
    (".doc", &["application/msword"]),
    (".pdf", &["application/pdf"]),
    (".rtf", &["application/rtf", "text/rtf"]),
    (
        ".txt",
        &[
            "text/plain",
            "application/txt",
            "text/anytext",
            "application/octet-stream",
        ],
    ),
    (".html", &["text/html"]),
    (".pages", &["application/x-iwork-pages-sffpages"]),
];

const FILE_TYPE_EXTENSIONS: &[(&str, &[&str])] = &[
    ("Word", &[".doc", ".docx"]),
    ("PDF", &[".pdf"]),
    ("OpenOffice", &[".odt"]),
    ("Apple Pages", &[".pages"]),
    ("RTF", &[".rtf"]),
    ("Text", &[".txt", ".html"]),
];

/// Why a resource was judged ineligible
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligible {
    Empty,
    TooLarge { length: u64, max: u64 },
    NoExtension,
    UnknownExtension(String),
    MimeMismatch { extension: String, content_type: String },
}

/// Extension → MIME set and type label → extension set tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedFileTypes {
    extensions_to_mime_types: BTreeMap<String, BTreeSet<String>>,
    file_types_to_extensions: BTreeMap<String, BTreeSet<String>>,
}

impl Default for AcceptedFileTypes {
    fn default() -> Self {
        Self::new(EXTENSION_MIME_TYPES, FILE_TYPE_EXTENSIONS)
    }
}

impl AcceptedFileTypes {
    pub fn new(extensions: &[(&str, &[&str])], file_types: &[(&str, &[&str])]) -> Self {
        let to_table = |rows: &[(&str, &[&str])]| {
            rows.iter()
                .map(|(key, values)| {
                    (
                        key.to_string(),
                        values.iter().map(|v| v.to_string()).collect::<BTreeSet<_>>(),
                    )
                })
                .collect::<BTreeMap<_, _>>()
        };

        Self {
            extensions_to_mime_types: to_table(extensions),
            file_types_to_extensions: to_table(file_types),
        }
    }

    /// Extension (with leading dot) → accepted MIME types
    pub fn extensions_to_mime_types(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.extensions_to_mime_types
    }

    /// Type label ("Word") → extensions (with leading dot)
    pub fn file_types_to_extensions(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.file_types_to_extensions
    }

    /// Check size bounds and the extension/MIME whitelist
    ///
    /// The extension is taken from the display name; the content id is used
    /// when the host set no display name.
    pub fn check(&self, resource: &dyn ContentResource, max_file_size: u64) -> Result<(), Ineligible> {
        let length = resource.content_length();
        if length == 0 {
            return Err(Ineligible::Empty);
        }
        if length > max_file_size {
            return Err(Ineligible::TooLarge {
                length,
                max: max_file_size,
            });
        }

        let name = resource.display_name().unwrap_or_else(|| resource.id());
        let extension = file_extension(name)
            .map(|ext| format!(".{}", ext))
            .ok_or(Ineligible::NoExtension)?;

        let mime_types = self
            .extensions_to_mime_types
            .get(&extension)
            .ok_or_else(|| Ineligible::UnknownExtension(extension.clone()))?;

        if !mime_types.contains(resource.content_type()) {
            return Err(Ineligible::MimeMismatch {
                extension,
                content_type: resource.content_type().to_string(),
            });
        }

        Ok(())
    }

    pub fn is_eligible(&self, resource: &dyn ContentResource, max_file_size: u64) -> bool {
        self.check(resource, max_file_size).is_ok()
    }
}
