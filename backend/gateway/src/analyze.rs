//! `POST /api/analyze`: forms and tables extraction.
//!
//! The OCR vendor's JSON is returned exactly as received.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::MultipartRejection,
    },
    http::HeaderMap,
};
use serde_json::Value;
use tracing::{Span, field, info, instrument};
use uuid::Uuid;

use formlens_core::AnalysisError;
use logging::{AuditEvent, EventLogger};

use crate::attachments::{admit_file, collect_form, ensure_within_limit};
use crate::error_response::{ApiError, report};
use crate::server::AppState;

#[instrument(name = "analyze", skip_all, fields(request_id = field::Empty))]
pub async fn analyze_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    Span::current().record("request_id", request_id.as_str());

    run(&state, &request_id, &headers, multipart)
        .await
        .map(Json)
        .map_err(report)
}

async fn run(
    state: &AppState,
    request_id: &str,
    headers: &HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Value, AnalysisError> {
    let limit = state.max_file_size();
    ensure_within_limit(headers, limit)?;

    let form = collect_form(multipart, limit).await?;
    let document = admit_file(form.file, &state.validator, limit)?;

    let provider = state.ocr.name().to_string();
    EventLogger::log_event(
        request_id,
        AuditEvent::OcrCall {
            provider: provider.clone(),
            document_bytes: document.len(),
        },
    );

    let start = Instant::now();
    let result = match state.ocr.analyze_document(&document).await {
        Ok(result) => result,
        Err(e) => {
            EventLogger::log_event(
                request_id,
                AuditEvent::VendorFailure {
                    provider,
                    error_msg: format!("{e:#}"),
                },
            );
            return Err(e.into());
        }
    };
    EventLogger::log_event(
        request_id,
        AuditEvent::VendorReply {
            provider,
            latency_ms: start.elapsed().as_millis() as u64,
        },
    );

    state.archiver.archive("textract", request_id, &result).await;

    info!(filename = %document.filename, "Document analysis complete");
    Ok(result)
}
