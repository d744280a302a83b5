//! formlens Gateway HTTP API Server
//!
//! Routes uploads to the OCR and header-enrichment vendors and maps every
//! failure onto the JSON error envelope.

pub mod analyze;
pub mod archive;
pub mod attachments;
pub mod error_response;
pub mod health_api;
pub mod server;
pub mod vision_context;

#[cfg(test)]
mod test_support;

pub use archive::ResponseArchiver;
pub use error_response::ApiError;
pub use server::{AppState, build_router, start_server};
