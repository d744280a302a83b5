//! Upload admission: filename sanitization and extension/MIME allow-listing.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use formlens_core::AnalysisError;

use crate::mime_detect::{detect_mime_type, file_extension, mime_essence};

pub const NO_FILE_PART: &str = "No file part in the request";
pub const NO_FILE_SELECTED: &str = "No file selected";
pub const INVALID_FILENAME: &str = "Invalid filename";

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "AUX", "COM1", "COM2", "COM3", "COM4", "LPT1", "LPT2", "LPT3", "PRN", "NUL",
];

/// What the client claimed about the `file` part.
#[derive(Debug, Clone, Default)]
pub struct DeclaredFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

/// A file part that passed validation; bytes are read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedUpload {
    pub filename: String,
    pub content_type: String,
}

/// Reduce a client-supplied filename to a safe ASCII basename.
///
/// Input is NFKD-normalized so accented letters keep their base form, then
/// remaining non-ASCII is dropped, path separators and whitespace collapse to `_`, anything
/// outside `[A-Za-z0-9_.-]` is removed, and leading/trailing `.`/`_` are trimmed.
/// May return an empty string.
pub fn sanitize_filename(raw: &str) -> String {
    let ascii: String = raw.nfkd().filter(char::is_ascii).collect();
    let spaced = ascii.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_CHARS.replace_all(&joined, "");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');

    let stem = trimmed.split('.').next().unwrap_or("");
    if !trimmed.is_empty()
        && WINDOWS_DEVICE_NAMES
            .iter()
            .any(|name| name.eq_ignore_ascii_case(stem))
    {
        return format!("_{trimmed}");
    }
    trimmed.to_string()
}

/// Validates uploads against the configured allow-lists.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    allowed_extensions: BTreeSet<String>,
    allowed_mime_types: BTreeSet<String>,
}

impl UploadValidator {
    pub fn new(allowed_extensions: BTreeSet<String>, allowed_mime_types: BTreeSet<String>) -> Self {
        Self {
            allowed_extensions,
            allowed_mime_types,
        }
    }

    /// Decide admission for the `file` part, or `None` when the request had none.
    pub fn validate(&self, declared: Option<&DeclaredFile>) -> Result<AcceptedUpload, AnalysisError> {
        let declared = declared.ok_or_else(|| AnalysisError::Validation(NO_FILE_PART.into()))?;

        let raw_name = declared
            .filename
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AnalysisError::Validation(NO_FILE_SELECTED.into()))?;

        let filename = sanitize_filename(raw_name);
        if filename.is_empty() {
            return Err(AnalysisError::Validation(INVALID_FILENAME.into()));
        }

        let content_type = declared.content_type.as_deref().map(mime_essence).unwrap_or_default();
        if !self.is_allowed(&filename, &content_type) {
            return Err(AnalysisError::Validation(self.type_not_allowed_message()));
        }

        let inferred = detect_mime_type(&filename);
        if inferred != content_type && !(inferred == "image/jpeg" && content_type == "image/jpg") {
            debug!(%filename, declared = %content_type, inferred, "Declared content type differs from extension");
        }

        Ok(AcceptedUpload {
            filename,
            content_type,
        })
    }

    /// Both the extension and the declared MIME type must be allow-listed.
    pub fn is_allowed(&self, filename: &str, content_type: &str) -> bool {
        let extension_allowed = self.allowed_extensions.contains(&file_extension(filename));
        let mime_allowed = self.allowed_mime_types.contains(&mime_essence(content_type));
        extension_allowed && mime_allowed
    }

    fn type_not_allowed_message(&self) -> String {
        let supported: Vec<&str> = self.allowed_extensions.iter().map(String::as_str).collect();
        format!("File type not allowed. Supported types: {}", supported.join(", "))
    }
}
