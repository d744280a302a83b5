//! Core types, error taxonomy, and vendor traits shared by every formlens crate.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{AnalysisError, ErrorBody, ErrorKind, OcrError, REJECTED_DOCUMENT_CODES};
pub use traits::{OcrProvider, VisionProvider, VisionRequest, VisionResponse};
pub use types::{CellsPayload, HeaderAnnotation, UploadedDocument, CELLS_FIELD};
