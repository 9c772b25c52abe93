//! Uploaded document metadata and file type checks.

use std::path::Path;

use crate::core::errors::ServiceError;

/// Extensions the service accepts, lowercase and without the leading dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf"];

/// Message returned to clients that upload an unsupported file type.
pub const UNSUPPORTED_TYPE_MESSAGE: &str = "Only PDF files are supported";

/// A client-submitted file, before its bytes are materialized.
///
/// The byte content itself is streamed straight into a scratch file and is
/// not held here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    filename: String,
    extension: String,
}

impl UploadedDocument {
    /// Validate `filename` and build the document descriptor.
    ///
    /// Fails with [`ServiceError::Validation`] when the filename is missing or
    /// does not end in a supported extension.
    pub fn from_filename(filename: Option<&str>) -> Result<Self, ServiceError> {
        let filename = match filename {
            Some(name) if !name.trim().is_empty() => name,
            _ => return Err(ServiceError::validation("No file name provided")),
        };

        if !is_supported_document(filename) {
            return Err(ServiceError::validation(UNSUPPORTED_TYPE_MESSAGE));
        }

        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        Ok(Self {
            filename: filename.to_string(),
            extension,
        })
    }

    /// The filename as sent by the client.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Lowercase extension without the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Suffix for the scratch file, e.g. `.pdf`.
    pub fn scratch_suffix(&self) -> String {
        format!(".{}", self.extension)
    }
}

/// Check if a filename ends in a supported document extension (case-insensitive).
pub fn is_supported_document(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Check if bytes start like a PDF file (magic bytes: %PDF)
pub fn is_pdf_bytes(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}
