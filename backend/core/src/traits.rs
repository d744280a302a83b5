use anyhow::Result;
use async_trait::async_trait;

use crate::error::OcrError;
use crate::types::UploadedDocument;

/// Trait for OCR vendors that extract forms and tables from a document.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Provider name (e.g., "textract").
    fn name(&self) -> &str;

    /// Run one extraction attempt and return the vendor's JSON response unmodified.
    async fn analyze_document(
        &self,
        document: &UploadedDocument,
    ) -> Result<serde_json::Value, OcrError>;
}

/// Trait for multimodal language-model vendors (text + one image in, text out).
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a single completion request and return the reply text.
    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse>;
}

/// Request to a multimodal provider.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub model: String,
    pub prompt: String,
    /// `data:` URI carrying the base64-encoded image.
    pub image_data_uri: String,
    pub max_tokens: u32,
}

/// Response from a multimodal provider.
#[derive(Debug, Clone)]
pub struct VisionResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}
