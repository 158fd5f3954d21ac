//! Uploaded document input

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Document types accepted for analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Txt,
    Doc,
    Docx,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::Pdf,
        DocumentKind::Txt,
        DocumentKind::Doc,
        DocumentKind::Docx,
    ];

    pub fn mime_type(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Txt => "text/plain",
            DocumentKind::Doc => "application/msword",
            DocumentKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Txt => "txt",
            DocumentKind::Doc => "doc",
            DocumentKind::Docx => "docx",
        }
    }

    /// Match a MIME type, ignoring parameters such as `; charset=utf-8`
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.mime_type().eq_ignore_ascii_case(essence))
    }

    /// Match the extension of a file name (case-insensitive)
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::ALL
            .into_iter()
            .find(|kind| kind.extension().eq_ignore_ascii_case(ext.trim()))
    }
}

/// A document handed to the registry for analysis
///
/// Contents are shared so retries can re-send the bytes without copying the file.
#[derive(Debug, Clone)]
pub struct DocumentFile {
    /// Caller-supplied name (may be missing or unusable)
    pub name: Option<String>,
    /// Caller-declared MIME type
    pub mime_type: Option<String>,
    pub contents: Arc<[u8]>,
}

impl DocumentFile {
    pub fn new(
        name: Option<impl Into<String>>,
        mime_type: Option<impl Into<String>>,
        contents: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.map(Into::into),
            mime_type: mime_type.map(Into::into),
            contents: Arc::from(contents.into()),
        }
    }

    pub fn size(&self) -> u64 {
        self.contents.len() as u64
    }
}

/// A document that passed boundary validation
#[derive(Debug, Clone)]
pub struct ValidatedDocument {
    /// Sanitized name, or a synthesized one when the caller's was unusable
    pub file_name: String,
    pub kind: DocumentKind,
    pub language: String,
    pub contents: Arc<[u8]>,
}

impl ValidatedDocument {
    pub fn size(&self) -> u64 {
        self.contents.len() as u64
    }

    pub fn info(&self) -> FileInfo {
        FileInfo {
            name: self.file_name.clone(),
            size: self.size(),
        }
    }
}

/// Name and size captured for the canonical model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
}
