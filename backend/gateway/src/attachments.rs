//! Multipart Upload Collection
//!
//! Reads the `file` part and the optional `simplified_cells` text part out of a
//! multipart body, then admits the file through the upload validator.

use axum::{
    body::Bytes,
    extract::{
        Multipart,
        multipart::{MultipartError, MultipartRejection},
    },
    http::{HeaderMap, StatusCode, header::CONTENT_LENGTH},
};
use tracing::{debug, info};

use formlens_core::{AnalysisError, CELLS_FIELD, UploadedDocument};
use formlens_media::{DeclaredFile, UploadValidator, upload::NO_FILE_PART};

const FILE_FIELD: &str = "file";

/// The `file` part as received: declared metadata plus its bytes.
#[derive(Debug)]
pub struct FilePart {
    pub declared: DeclaredFile,
    pub bytes: Bytes,
}

#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<FilePart>,
    pub cells: Option<String>,
}

/// Rejects a request whose declared length already exceeds the limit.
pub fn ensure_within_limit(headers: &HeaderMap, limit_bytes: u64) -> Result<(), AnalysisError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    match declared {
        Some(len) if len > limit_bytes => {
            debug!(content_length = len, limit_bytes, "Rejecting oversized request");
            Err(AnalysisError::FileTooLarge { limit_bytes })
        }
        _ => Ok(()),
    }
}

/// Drains the multipart body. Only the first `file` and `simplified_cells`
/// parts are kept; other fields are skipped.
pub async fn collect_form(
    multipart: Result<Multipart, MultipartRejection>,
    limit_bytes: u64,
) -> Result<UploadForm, AnalysisError> {
    let mut multipart = multipart.map_err(|rejection| {
        debug!(%rejection, "Request body is not multipart");
        AnalysisError::Validation(NO_FILE_PART.into())
    })?;

    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| read_failure(e, limit_bytes))?
    {
        match field.name() {
            Some(FILE_FIELD) if form.file.is_none() => {
                let declared = DeclaredFile {
                    filename: field.file_name().map(str::to_string),
                    content_type: field.content_type().map(str::to_string),
                };
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| read_failure(e, limit_bytes))?;
                form.file = Some(FilePart { declared, bytes });
            }
            Some(CELLS_FIELD) if form.cells.is_none() => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| read_failure(e, limit_bytes))?;
                form.cells = Some(text);
            }
            other => debug!(field = ?other, "Skipping multipart field"),
        }
    }

    Ok(form)
}

/// Validates the declared file and turns it into a document.
pub fn admit_file(
    file: Option<FilePart>,
    validator: &UploadValidator,
    limit_bytes: u64,
) -> Result<UploadedDocument, AnalysisError> {
    let part = file.ok_or_else(|| AnalysisError::Validation(NO_FILE_PART.into()))?;
    let accepted = validator.validate(Some(&part.declared))?;

    let document =
        UploadedDocument::new(accepted.filename, accepted.content_type, part.bytes, limit_bytes)?;
    info!(
        filename = %document.filename,
        content_type = %document.content_type,
        bytes = document.len(),
        "Upload accepted"
    );
    Ok(document)
}

fn read_failure(err: MultipartError, limit_bytes: u64) -> AnalysisError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AnalysisError::FileTooLarge { limit_bytes }
    } else {
        AnalysisError::UnreadableFile(err.body_text())
    }
}
