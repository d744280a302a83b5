use serde::Serialize;
use thiserror::Error;

/// Document codes the OCR vendor uses to reject the input itself rather than fail.
pub const REJECTED_DOCUMENT_CODES: &[&str] = &[
    "InvalidParameterException",
    "DocumentTooLargeException",
    "UnsupportedDocumentException",
    "BadDocumentException",
];

const MIB: u64 = 1024 * 1024;

/// User-facing failure category. The label is the `type` field of every error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    File,
    Vendor,
    Configuration,
    Server,
    NotFound,
    MethodNotAllowed,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "Validation Error",
            ErrorKind::File => "File Error",
            ErrorKind::Vendor => "AWS Error",
            ErrorKind::Configuration => "Configuration Error",
            ErrorKind::Server => "Server Error",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::MethodNotAllowed => "Method Not Allowed",
        }
    }
}

/// Top-level error type for a single analysis request.
///
/// The `Display` form is for logs only; callers see [`AnalysisError::public_message`].
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("upload rejected: {0}")]
    Validation(String),

    #[error("empty file uploaded")]
    EmptyFile,

    #[error("failed to read uploaded file: {0}")]
    UnreadableFile(String),

    #[error("upload exceeds {limit_bytes} bytes")]
    FileTooLarge { limit_bytes: u64 },

    #[error("OCR vendor rejected the document ({code}): {message}")]
    DocumentRejected { code: String, message: String },

    #[error("OCR vendor error ({code}): {message}")]
    VendorService { code: String, message: String },

    #[error("AWS credentials could not be resolved")]
    MissingCredentials,

    #[error("multimodal API key is not configured")]
    MissingApiKey,

    #[error("no route for {path}")]
    NotFound { path: String },

    #[error("method {method} not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::Validation(_) => ErrorKind::Validation,
            AnalysisError::EmptyFile
            | AnalysisError::UnreadableFile(_)
            | AnalysisError::FileTooLarge { .. } => ErrorKind::File,
            AnalysisError::DocumentRejected { .. } | AnalysisError::VendorService { .. } => {
                ErrorKind::Vendor
            }
            AnalysisError::MissingCredentials | AnalysisError::MissingApiKey => {
                ErrorKind::Configuration
            }
            AnalysisError::NotFound { .. } => ErrorKind::NotFound,
            AnalysisError::MethodNotAllowed { .. } => ErrorKind::MethodNotAllowed,
            AnalysisError::Internal(_) => ErrorKind::Server,
        }
    }

    /// HTTP status code for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            AnalysisError::Validation(_)
            | AnalysisError::EmptyFile
            | AnalysisError::UnreadableFile(_)
            | AnalysisError::DocumentRejected { .. } => 400,
            AnalysisError::NotFound { .. } => 404,
            AnalysisError::MethodNotAllowed { .. } => 405,
            AnalysisError::FileTooLarge { .. } => 413,
            AnalysisError::VendorService { .. }
            | AnalysisError::MissingCredentials
            | AnalysisError::MissingApiKey
            | AnalysisError::Internal(_) => 500,
        }
    }

    /// Sanitized message safe to return to the caller.
    pub fn public_message(&self) -> String {
        match self {
            AnalysisError::Validation(reason) => reason.clone(),
            AnalysisError::EmptyFile => "Empty file uploaded".to_string(),
            AnalysisError::UnreadableFile(_) => "Failed to read uploaded file".to_string(),
            AnalysisError::FileTooLarge { limit_bytes } => format!(
                "File too large. Maximum size allowed: {}MB",
                limit_bytes / MIB
            ),
            AnalysisError::DocumentRejected { code, .. } => match code.as_str() {
                "InvalidParameterException" => {
                    "Invalid document format or corrupted file".to_string()
                }
                "DocumentTooLargeException" => {
                    "Document size exceeds the maximum allowed limit".to_string()
                }
                _ => "Unsupported or unreadable document".to_string(),
            },
            AnalysisError::VendorService { message, .. } => {
                format!("Textract service error: {message}")
            }
            AnalysisError::MissingCredentials => {
                "AWS credentials not configured. Please check your AWS setup.".to_string()
            }
            AnalysisError::MissingApiKey => "OpenAI API key not configured".to_string(),
            AnalysisError::NotFound { .. } => "The requested endpoint was not found".to_string(),
            AnalysisError::MethodNotAllowed { method, .. } => {
                format!("Method {method} is not allowed for this endpoint")
            }
            AnalysisError::Internal(_) => {
                "An unexpected error occurred. Please try again.".to_string()
            }
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind().label(),
            error: self.public_message(),
        }
    }
}

/// JSON error envelope: `{"type": ..., "error": ...}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub error: String,
}

/// Failure reported by an OCR vendor client.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("no credentials available for the OCR vendor")]
    MissingCredentials,

    #[error("document rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error("vendor service error ({code}): {message}")]
    Service { code: String, message: String },

    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl OcrError {
    /// Sorts a vendor error code into a document rejection or a service failure.
    pub fn from_vendor_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let message = message.into();
        if REJECTED_DOCUMENT_CODES.contains(&code.as_str()) {
            OcrError::Rejected { code, message }
        } else {
            OcrError::Service { code, message }
        }
    }
}

impl From<OcrError> for AnalysisError {
    fn from(err: OcrError) -> Self {
        match err {
            OcrError::MissingCredentials => AnalysisError::MissingCredentials,
            OcrError::Rejected { code, message } => {
                AnalysisError::DocumentRejected { code, message }
            }
            OcrError::Service { code, message } => AnalysisError::VendorService { code, message },
            OcrError::Transport(e) => AnalysisError::Internal(e),
        }
    }
}
