//! Shared fixtures for in-process handler tests.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use serde_json::Value;
use tower::ServiceExt;

use formlens_config::GatewayConfig;
use formlens_core::{
    OcrError, OcrProvider, UploadedDocument, VisionProvider, VisionRequest, VisionResponse,
};
use formlens_understanding::HeaderEnricher;

use crate::server::{AppState, build_router};

const BOUNDARY: &str = "formlens-test-boundary";

type OcrScript = Box<dyn Fn() -> Result<Value, OcrError> + Send + Sync>;

pub struct MockOcr {
    calls: AtomicUsize,
    script: OcrScript,
}

impl MockOcr {
    pub fn ok(reply: Value) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: Box::new(move || Ok(reply.clone())),
        })
    }

    pub fn failing(err: impl Fn() -> OcrError + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: Box::new(move || Err(err())),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrProvider for MockOcr {
    fn name(&self) -> &str {
        "mock-ocr"
    }

    async fn analyze_document(&self, _document: &UploadedDocument) -> Result<Value, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.script)()
    }
}

pub struct MockVision {
    calls: AtomicUsize,
    reply: std::result::Result<String, String>,
    last_prompt: Mutex<String>,
}

impl MockVision {
    pub fn replying(content: &str) -> Arc<Self> {
        Self::build(Ok(content.to_string()))
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::build(Err(message.to_string()))
    }

    fn build(reply: std::result::Result<String, String>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            reply,
            last_prompt: Mutex::new(String::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> String {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionProvider for MockVision {
    fn name(&self) -> &str {
        "mock-vision"
    }

    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = request.prompt.clone();
        match &self.reply {
            Ok(content) => Ok(VisionResponse {
                content: content.clone(),
                provider: "mock-vision".into(),
                model: request.model.clone(),
                tokens_used: 0,
                latency_ms: 1,
            }),
            Err(message) => bail!("{message}"),
        }
    }
}

pub fn test_router(
    config: GatewayConfig,
    ocr: Arc<MockOcr>,
    vision: Option<Arc<MockVision>>,
) -> Router {
    let enricher = vision.map(|v| {
        HeaderEnricher::new(v, config.vision.model.clone(), config.vision.max_tokens)
    });
    build_router(Arc::new(AppState::new(Arc::new(config), ocr, enricher)))
}

/// One multipart part. `filename` marks it as a file part.
pub struct Part<'a> {
    name: &'a str,
    filename: Option<&'a str>,
    content_type: Option<&'a str>,
    data: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn file(filename: &'a str, content_type: &'a str, data: &'a [u8]) -> Self {
        Self {
            name: "file",
            filename: Some(filename),
            content_type: Some(content_type),
            data,
        }
    }

    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            filename: None,
            content_type: None,
            data: value.as_bytes(),
        }
    }
}

/// Encodes `multipart/form-data`; returns the Content-Type header and the body.
pub fn multipart_body(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(filename) = part.filename {
            disposition.push_str(&format!("; filename=\"{filename}\""));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

pub fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let (content_type, body) = multipart_body(parts);
    Request::post(uri)
        .header(CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap()
}

/// Drives the router once and parses the JSON body.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

pub fn tiny_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(6, 4, image::Rgb([240, 240, 240]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}
