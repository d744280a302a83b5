use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Name of the multipart field carrying previously extracted cells.
pub const CELLS_FIELD: &str = "simplified_cells";

/// A validated upload, owned by exactly one request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedDocument {
    /// Builds a document from an admitted upload, enforcing `0 < len <= max_bytes`.
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Bytes,
        max_bytes: u64,
    ) -> Result<Self, AnalysisError> {
        if bytes.is_empty() {
            return Err(AnalysisError::EmptyFile);
        }
        if bytes.len() as u64 > max_bytes {
            return Err(AnalysisError::FileTooLarge {
                limit_bytes: max_bytes,
            });
        }
        Ok(Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Caller-supplied cell records, kept as the raw JSON text they arrived in.
///
/// Only presence is checked; the internal structure belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellsPayload(String);

impl CellsPayload {
    /// Admits the `simplified_cells` field.
    ///
    /// An absent or blank field is always missing. A literal empty JSON array
    /// counts as missing only when `reject_empty_array` is set.
    pub fn from_field(raw: Option<String>, reject_empty_array: bool) -> Result<Self, AnalysisError> {
        let missing = || AnalysisError::Validation(format!("No {CELLS_FIELD} data provided"));

        let raw = raw.filter(|s| !s.trim().is_empty()).ok_or_else(missing)?;

        if reject_empty_array
            && matches!(
                serde_json::from_str::<serde_json::Value>(&raw),
                Ok(serde_json::Value::Array(ref cells)) if cells.is_empty()
            )
        {
            return Err(missing());
        }

        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Hierarchical header labels the multimodal vendor is asked to attach to each cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderAnnotation {
    pub row_header: String,
    pub column_header: String,
}

impl HeaderAnnotation {
    /// Joins parent and child header levels.
    pub const SEPARATOR: &'static str = " > ";

    /// Key under which the annotation is added to each cell object.
    pub const FIELD: &'static str = "headers";

    pub fn from_levels(row_levels: &[&str], column_levels: &[&str]) -> Self {
        Self {
            row_header: row_levels.join(Self::SEPARATOR),
            column_header: column_levels.join(Self::SEPARATOR),
        }
    }
}
