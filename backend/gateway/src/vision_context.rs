//! `POST /api/analyze-vision-context`: hierarchical header enrichment.
//!
//! Takes an image plus the caller's `simplified_cells` and answers with
//! `{"aiHeaderAnalysis": "<fence-stripped model reply>"}`.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::HeaderMap,
};
use serde::Serialize;
use serde_json::json;
use tracing::{Span, field, info, instrument};
use uuid::Uuid;

use formlens_core::{AnalysisError, CellsPayload};
use formlens_media::is_image;

use crate::attachments::{admit_file, collect_form, ensure_within_limit};
use crate::error_response::{ApiError, report};
use crate::server::AppState;

pub const IMAGE_REQUIRED: &str = "Header analysis requires an image file";

#[derive(Debug, Serialize)]
pub struct VisionContextResponse {
    #[serde(rename = "aiHeaderAnalysis")]
    pub ai_header_analysis: String,
}

#[instrument(name = "analyze_vision_context", skip_all, fields(request_id = field::Empty))]
pub async fn analyze_vision_context(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VisionContextResponse>, ApiError> {
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
) -> Result<VisionContextResponse, AnalysisError> {
    let limit = state.max_file_size();
    ensure_within_limit(headers, limit)?;

    let form = collect_form(multipart, limit).await?;
    let image = admit_file(form.file, &state.validator, limit)?;
    let cells = CellsPayload::from_field(form.cells, state.config.vision.reject_empty_cells)?;

    if !is_image(&image.content_type) {
        return Err(AnalysisError::Validation(IMAGE_REQUIRED.into()));
    }

    let enricher = state.enricher.as_ref().ok_or(AnalysisError::MissingApiKey)?;
    let outcome = enricher.enrich(request_id, &image, &cells).await?;

    state
        .archiver
        .archive(
            "vision",
            request_id,
            &json!({
                "model": enricher.model(),
                "rawReply": outcome.raw_reply,
                "aiHeaderAnalysis": outcome.analysis,
            }),
        )
        .await;

    info!(
        filename = %image.filename,
        latency_ms = outcome.latency_ms,
        "Header analysis returned"
    );
    Ok(VisionContextResponse {
        ai_header_analysis: outcome.analysis,
    })
}

#[cfg(test)]
mod tests {
    use crate::test_support::{MockOcr, MockVision, Part, multipart_request, send, test_router, tiny_png};
    use formlens_config::GatewayConfig;
    use serde_json::json;

    const URI: &str = "/api/analyze-vision-context";
    const CELLS: &str = r#"[{"id":"c1","text":"1,200"},{"id":"c2","text":"Revenue"}]"#;

    #[tokio::test]
    async fn strips_json_fence_from_reply() {
        let vision = MockVision::replying("```json\n[{\"id\":\"c1\"}]\n```");
        let app = test_router(GatewayConfig::default(), MockOcr::ok(json!({})), Some(vision.clone()));

        let png = tiny_png();
        let req = multipart_request(
            URI,
            &[Part::file("table.png", "image/png", &png), Part::text("simplified_cells", CELLS)],
        );
        let (status, body) = send(app, req).await;

        assert_eq!(status, 200);
        assert_eq!(body, json!({"aiHeaderAnalysis": "[{\"id\":\"c1\"}]"}));
        assert_eq!(vision.calls(), 1);
        assert!(vision.last_prompt().contains(CELLS));
    }

    #[tokio::test]
    async fn unfenced_reply_is_returned_verbatim() {
        let vision = MockVision::replying("  not json at all\n");
        let app = test_router(GatewayConfig::default(), MockOcr::ok(json!({})), Some(vision));

        let png = tiny_png();
        let req = multipart_request(
            URI,
            &[Part::file("table.png", "image/png", &png), Part::text("simplified_cells", CELLS)],
        );
        let (status, body) = send(app, req).await;

        assert_eq!(status, 200);
        assert_eq!(body["aiHeaderAnalysis"], "  not json at all\n");
    }

    #[tokio::test]
    async fn missing_cells_is_400_without_vendor_calls() {
        let vision = MockVision::replying("[]");
        let ocr = MockOcr::ok(json!({}));
        let app = test_router(GatewayConfig::default(), ocr.clone(), Some(vision.clone()));

        let png = tiny_png();
        let req = multipart_request(URI, &[Part::file("table.png", "image/png", &png)]);
        let (status, body) = send(app, req).await;

        assert_eq!(status, 400);
        assert_eq!(
            body,
            json!({"type": "Validation Error", "error": "No simplified_cells data provided"})
        );
        assert_eq!(vision.calls(), 0);
        assert_eq!(ocr.calls(), 0);
    }

    #[tokio::test]
    async fn blank_cells_are_missing() {
        let vision = MockVision::replying("[]");
        let app = test_router(GatewayConfig::default(), MockOcr::ok(json!({})), Some(vision.clone()));

        let png = tiny_png();
        let req = multipart_request(
            URI,
            &[Part::file("table.png", "image/png", &png), Part::text("simplified_cells", "")],
        );
        let (status, _) = send(app, req).await;

        assert_eq!(status, 400);
        assert_eq!(vision.calls(), 0);
    }

    #[tokio::test]
    async fn empty_array_is_forwarded_by_default() {
        let vision = MockVision::replying("[]");
        let app = test_router(GatewayConfig::default(), MockOcr::ok(json!({})), Some(vision.clone()));

        let png = tiny_png();
        let req = multipart_request(
            URI,
            &[Part::file("table.png", "image/png", &png), Part::text("simplified_cells", "[]")],
        );
        let (status, body) = send(app, req).await;

        assert_eq!(status, 200);
        assert_eq!(body["aiHeaderAnalysis"], "[]");
        assert_eq!(vision.calls(), 1);
    }

    #[tokio::test]
    async fn empty_array_is_rejected_when_configured() {
        let mut config = GatewayConfig::default();
        config.vision.reject_empty_cells = true;
        let vision = MockVision::replying("[]");
        let app = test_router(config, MockOcr::ok(json!({})), Some(vision.clone()));

        let png = tiny_png();
        let req = multipart_request(
            URI,
            &[Part::file("table.png", "image/png", &png), Part::text("simplified_cells", "[]")],
        );
        let (status, body) = send(app, req).await;

        assert_eq!(status, 400);
        assert_eq!(body["error"], "No simplified_cells data provided");
        assert_eq!(vision.calls(), 0);
    }

    #[tokio::test]
    async fn pdf_is_rejected_before_vendor() {
        let vision = MockVision::replying("[]");
        let app = test_router(GatewayConfig::default(), MockOcr::ok(json!({})), Some(vision.clone()));

        let req = multipart_request(
            URI,
            &[
                Part::file("table.pdf", "application/pdf", b"%PDF-1.7"),
                Part::text("simplified_cells", CELLS),
            ],
        );
        let (status, body) = send(app, req).await;

        assert_eq!(status, 400);
        assert_eq!(body["error"], super::IMAGE_REQUIRED);
        assert_eq!(vision.calls(), 0);
    }

    #[tokio::test]
    async fn missing_api_key_is_configuration_error() {
        let app = test_router(GatewayConfig::default(), MockOcr::ok(json!({})), None);

        let png = tiny_png();
        let req = multipart_request(
            URI,
            &[Part::file("table.png", "image/png", &png), Part::text("simplified_cells", CELLS)],
        );
        let (status, body) = send(app, req).await;

        assert_eq!(status, 500);
        assert_eq!(
            body,
            json!({"type": "Configuration Error", "error": "OpenAI API key not configured"})
        );
    }

    #[tokio::test]
    async fn vendor_failure_is_generic_server_error() {
        let vision = MockVision::failing("429 rate limited");
        let app = test_router(GatewayConfig::default(), MockOcr::ok(json!({})), Some(vision.clone()));

        let png = tiny_png();
        let req = multipart_request(
            URI,
            &[Part::file("table.png", "image/png", &png), Part::text("simplified_cells", CELLS)],
        );
        let (status, body) = send(app, req).await;

        assert_eq!(status, 500);
        assert_eq!(
            body,
            json!({"type": "Server Error", "error": "An unexpected error occurred. Please try again."})
        );
        assert_eq!(vision.calls(), 1);
    }

    #[tokio::test]
    async fn undecodable_image_is_server_error() {
        let vision = MockVision::replying("[]");
        let app = test_router(GatewayConfig::default(), MockOcr::ok(json!({})), Some(vision.clone()));

        let req = multipart_request(
            URI,
            &[
                Part::file("table.png", "image/png", b"definitely not a png"),
                Part::text("simplified_cells", CELLS),
            ],
        );
        let (status, body) = send(app, req).await;

        assert_eq!(status, 500);
        assert_eq!(body["type"], "Server Error");
        assert_eq!(vision.calls(), 0);
    }

    #[tokio::test]
    async fn oversized_image_is_413_before_vendor() {
        let mut config = GatewayConfig::default();
        config.upload.max_file_size = 1024 * 1024;
        let vision = MockVision::replying("[]");
        let app = test_router(config, MockOcr::ok(json!({})), Some(vision.clone()));

        let big = vec![3u8; 2 * 1024 * 1024];
        let req = multipart_request(
            URI,
            &[Part::file("table.png", "image/png", &big), Part::text("simplified_cells", CELLS)],
        );
        let (status, body) = send(app, req).await;

        assert_eq!(status, 413);
        assert_eq!(
            body,
            json!({"type": "File Error", "error": "File too large. Maximum size allowed: 1MB"})
        );
        assert_eq!(vision.calls(), 0);
    }
}
