//! Header enrichment: image + cells in, fence-stripped model reply out.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use formlens_core::{CellsPayload, UploadedDocument, VisionProvider, VisionRequest};
use formlens_media::prepare_for_vision;
use logging::{AuditEvent, EventLogger};
use markdown::extract_json_payload;

use crate::prompt::build_header_prompt;

#[derive(Debug, Clone)]
pub struct EnrichmentOutcome {
    /// The reply with any `json` fence removed. Not parsed or validated.
    pub analysis: String,
    pub raw_reply: String,
    pub latency_ms: u64,
}

pub struct HeaderEnricher {
    provider: Arc<dyn VisionProvider>,
    model: String,
    max_tokens: u32,
}

impl HeaderEnricher {
    pub fn new(provider: Arc<dyn VisionProvider>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Makes exactly one vendor call. Image decoding runs on the blocking pool.
    pub async fn enrich(
        &self,
        request_id: &str,
        image: &UploadedDocument,
        cells: &CellsPayload,
    ) -> Result<EnrichmentOutcome> {
        let bytes = image.bytes.clone();
        let prepared = tokio::task::spawn_blocking(move || prepare_for_vision(&bytes))
            .await
            .context("Image preparation task failed")??;

        debug!(
            width = prepared.width,
            height = prepared.height,
            jpeg_bytes = prepared.jpeg_bytes,
            "Image ready for vision request"
        );

        let request = VisionRequest {
            model: self.model.clone(),
            prompt: build_header_prompt(cells),
            image_data_uri: prepared.data_uri,
            max_tokens: self.max_tokens,
        };

        EventLogger::log_event(
            request_id,
            AuditEvent::VisionCall {
                provider: self.provider.name().to_string(),
                model: self.model.clone(),
                prompt_chars: request.prompt.len(),
            },
        );

        let response = match self.provider.complete(&request).await {
            Ok(response) => response,
            Err(e) => {
                EventLogger::log_event(
                    request_id,
                    AuditEvent::VendorFailure {
                        provider: self.provider.name().to_string(),
                        error_msg: format!("{e:#}"),
                    },
                );
                return Err(e);
            }
        };

        EventLogger::log_event(
            request_id,
            AuditEvent::VendorReply {
                provider: response.provider.clone(),
                latency_ms: response.latency_ms,
            },
        );

        let analysis = extract_json_payload(&response.content);
        info!(
            reply_chars = response.content.len(),
            analysis_chars = analysis.len(),
            "Header analysis complete"
        );

        Ok(EnrichmentOutcome {
            analysis,
            raw_reply: response.content,
            latency_ms: response.latency_ms,
        })
    }
}
