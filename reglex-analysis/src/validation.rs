//! Boundary validation for analysis requests
//!
//! Runs before any session exists. A missing or unusable file name is not a
//! validation failure: a fallback name is synthesized and logged as recoverable.

use chrono::Utc;
use thiserror::Error;

use crate::models::{DocumentFile, DocumentKind, ValidatedDocument};

/// Default upload size limit (50 MiB)
pub const MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// Maximum accepted file name length (characters)
pub const MAX_FILE_NAME_LEN: usize = 255;

const DISALLOWED_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Request rejected at the boundary; never retried, never degraded to fallback
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File is empty")]
    EmptyFile,

    #[error("File is too large: {size} bytes (maximum {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Unsupported file type: {0} (supported: pdf, txt, doc, docx)")]
    UnsupportedType(String),

    #[error("Language code is required")]
    MissingLanguage,
}

/// Why a caller-supplied name was replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameIssue {
    Missing,
    TooLong,
    DisallowedCharacters,
}

impl NameIssue {
    fn as_str(self) -> &'static str {
        match self {
            NameIssue::Missing => "missing",
            NameIssue::TooLong => "too long",
            NameIssue::DisallowedCharacters => "disallowed characters",
        }
    }
}

/// Validate a document and language against the boundary constraints
///
/// Checks run in order: size, type, language.
pub fn validate_request(
    file: &DocumentFile,
    language: &str,
    max_file_size: u64,
) -> Result<ValidatedDocument, ValidationError> {
    let size = file.size();
    if size == 0 {
        return Err(ValidationError::EmptyFile);
    }
    if size > max_file_size {
        return Err(ValidationError::FileTooLarge {
            size,
            max: max_file_size,
        });
    }

    let kind = detect_kind(file)?;

    let language = language.trim();
    if language.is_empty() {
        return Err(ValidationError::MissingLanguage);
    }

    let file_name = match check_file_name(file.name.as_deref()) {
        Ok(name) => name,
        Err(issue) => {
            let fallback = fallback_file_name(kind);
            tracing::warn!(
                original_name = ?file.name,
                issue = issue.as_str(),
                fallback_name = %fallback,
                recoverable = true,
                "File name unusable, synthesized fallback name"
            );
            fallback
        }
    };

    Ok(ValidatedDocument {
        file_name,
        kind,
        language: language.to_string(),
        contents: file.contents.clone(),
    })
}

/// Sanitize a caller-supplied name, reporting why it cannot be used
pub fn check_file_name(name: Option<&str>) -> Result<String, NameIssue> {
    let name = name.map(str::trim).unwrap_or("");
    if name.is_empty() {
        return Err(NameIssue::Missing);
    }
    if name.chars().count() > MAX_FILE_NAME_LEN {
        return Err(NameIssue::TooLong);
    }
    if name
        .chars()
        .any(|c| c.is_control() || DISALLOWED_NAME_CHARS.contains(&c))
    {
        return Err(NameIssue::DisallowedCharacters);
    }
    Ok(name.to_string())
}

/// Detect the document type: declared MIME, then content sniffing, then extension
pub fn detect_kind(file: &DocumentFile) -> Result<DocumentKind, ValidationError> {
    if let Some(kind) = file.mime_type.as_deref().and_then(DocumentKind::from_mime) {
        return Ok(kind);
    }

    if let Some(sniffed) = infer::get(&file.contents) {
        if let Some(kind) = DocumentKind::from_mime(sniffed.mime_type()) {
            return Ok(kind);
        }
    }

    if let Some(kind) = file
        .name
        .as_deref()
        .and_then(|name| DocumentKind::from_file_name(name.trim()))
    {
        return Ok(kind);
    }

    let described = file
        .mime_type
        .clone()
        .or_else(|| file.name.clone())
        .unwrap_or_else(|| "unknown".to_string());
    Err(ValidationError::UnsupportedType(described))
}

fn fallback_file_name(kind: DocumentKind) -> String {
    format!(
        "document_{}.{}",
        Utc::now().timestamp_millis(),
        kind.extension()
    )
}
