//! Optical Character Recognition (OCR) via AWS Textract.
//!
//! Calls `AnalyzeDocument` with FORMS and TABLES over the shared HTTP client,
//! signing each request with SigV4. The response body is returned as parsed
//! JSON without reshaping, so callers see exactly what Textract produced.

use std::time::{Instant, SystemTime};

use anyhow::Context;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_sigv4::http_request::{SignableBody, SignableRequest, SigningSettings, sign};
use aws_sigv4::sign::v4;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Value, json};
use tracing::{info, warn};

use formlens_core::{OcrError, OcrProvider, UploadedDocument};
use logging::redact_sensitive_data;

const PROVIDER_NAME: &str = "textract";
const SIGNING_NAME: &str = "textract";
const TARGET: &str = "Textract.AnalyzeDocument";
const AMZ_JSON: &str = "application/x-amz-json-1.1";
const FEATURE_TYPES: [&str; 2] = ["FORMS", "TABLES"];

/// AWS Textract client. Built once and shared by every request.
pub struct TextractProvider {
    client: Client,
    region: String,
    endpoint: String,
    credentials: Option<SharedCredentialsProvider>,
}

impl TextractProvider {
    pub fn new(
        client: Client,
        region: impl Into<String>,
        endpoint: impl Into<String>,
        credentials: Option<SharedCredentialsProvider>,
    ) -> Self {
        Self {
            client,
            region: region.into(),
            endpoint: endpoint.into(),
            credentials,
        }
    }

    /// Builds a client whose credentials come from the AWS default provider chain
    /// (environment, shared profile, container or instance metadata).
    pub async fn from_default_chain(
        client: Client,
        region: &str,
        endpoint: impl Into<String>,
    ) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        let credentials = sdk_config.credentials_provider();
        if credentials.is_none() {
            warn!("No AWS credentials provider configured; /api/analyze will fail");
        }

        Self::new(client, region, endpoint, credentials)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Resolves credentials once without calling Textract.
    pub async fn check_credentials(&self) -> Result<(), OcrError> {
        self.resolve_credentials().await.map(|_| ())
    }

    async fn resolve_credentials(&self) -> Result<Credentials, OcrError> {
        let provider = self.credentials.as_ref().ok_or(OcrError::MissingCredentials)?;
        provider.provide_credentials().await.map_err(|e| {
            warn!(error = %e, "AWS credentials not found");
            OcrError::MissingCredentials
        })
    }

    /// Headers for one signed `AnalyzeDocument` call.
    fn signed_headers(&self, body: &[u8], credentials: Credentials) -> anyhow::Result<HeaderMap> {
        let identity = credentials.into();
        let params = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(SIGNING_NAME)
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()
            .context("Failed to build SigV4 signing params")?
            .into();

        let base_headers = [("content-type", AMZ_JSON), ("x-amz-target", TARGET)];
        let signable = SignableRequest::new(
            "POST",
            self.endpoint.as_str(),
            base_headers.iter().copied(),
            SignableBody::Bytes(body),
        )
        .context("Failed to build signable Textract request")?;

        let (instructions, _signature) = sign(signable, &params)
            .context("Failed to sign Textract request")?
            .into_parts();

        let mut headers = HeaderMap::new();
        for (name, value) in base_headers.iter().copied().chain(instructions.headers()) {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes()).context("Invalid signed header name")?,
                HeaderValue::from_str(value).context("Invalid signed header value")?,
            );
        }
        Ok(headers)
    }
}

#[async_trait]
impl OcrProvider for TextractProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn analyze_document(&self, document: &UploadedDocument) -> Result<Value, OcrError> {
        let credentials = self.resolve_credentials().await?;

        let body = serde_json::to_vec(&json!({
            "Document": { "Bytes": STANDARD.encode(&document.bytes) },
            "FeatureTypes": FEATURE_TYPES,
        }))
        .context("Failed to serialize Textract request")?;

        let headers = self.signed_headers(&body, credentials)?;

        info!(
            bytes = document.len(),
            region = %self.region,
            "Starting Textract document analysis"
        );
        let start = Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .headers(headers)
            .body(body)
            .send()
            .await
            .context("Textract HTTP request failed")?;

        let status = response.status();
        let error_type = response
            .headers()
            .get("x-amzn-errortype")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let raw = response
            .bytes()
            .await
            .context("Failed to read Textract response body")?;

        if !status.is_success() {
            let err = parse_error(status.as_u16(), error_type.as_deref(), &raw);
            warn!(
                status = status.as_u16(),
                error = %redact_sensitive_data(&err.to_string()),
                "AWS Textract error"
            );
            return Err(err);
        }

        let result: Value =
            serde_json::from_slice(&raw).context("Textract returned a non-JSON body")?;

        info!(
            latency_ms = start.elapsed().as_millis() as u64,
            "Textract analysis completed successfully"
        );
        Ok(result)
    }
}

/// Turns a non-2xx Textract reply into an [`OcrError`].
///
/// The code comes from the `x-amzn-ErrorType` header (`Code:namespace`) or the
/// body's `__type` (`namespace#Code`); the message from `message` or `Message`.
pub fn parse_error(status: u16, error_type: Option<&str>, body: &[u8]) -> OcrError {
    let parsed: Value = serde_json::from_slice(body).unwrap_or(Value::Null);

    let code = error_type
        .and_then(|header| header.split(':').next())
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .or_else(|| {
            parsed
                .get("__type")
                .and_then(Value::as_str)
                .and_then(|t| t.rsplit('#').next())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("HTTP{status}"));

    let message = parsed
        .get("message")
        .or_else(|| parsed.get("Message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());

    OcrError::from_vendor_code(code, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Bytes, http::HeaderMap as AxumHeaders, http::StatusCode, routing::post};
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    async fn spawn_mock(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn test_credentials() -> Option<SharedCredentialsProvider> {
        Some(SharedCredentialsProvider::new(Credentials::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            None,
            None,
            "test",
        )))
    }

    fn document(bytes: &'static [u8]) -> UploadedDocument {
        UploadedDocument::new("form.png", "image/png", bytes.into(), 1024).unwrap()
    }

    #[test]
    fn parses_code_from_header() {
        let err = parse_error(
            400,
            Some("InvalidParameterException:http://internal.amazon.com/coral/com.amazonaws.textract/"),
            br#"{"message":"Request has invalid parameters"}"#,
        );
        match err {
            OcrError::Rejected { code, message } => {
                assert_eq!(code, "InvalidParameterException");
                assert_eq!(message, "Request has invalid parameters");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_code_from_body_type() {
        let err = parse_error(
            400,
            None,
            br#"{"__type":"com.amazonaws.textract#DocumentTooLargeException","Message":"too big"}"#,
        );
        assert!(matches!(err, OcrError::Rejected { ref code, .. } if code == "DocumentTooLargeException"));
    }

    #[test]
    fn unknown_failure_is_service_error() {
        let err = parse_error(503, None, b"upstream unavailable");
        match err {
            OcrError::Service { code, message } => {
                assert_eq!(code, "HTTP503");
                assert_eq!(message, "upstream unavailable");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_credentials_short_circuits() {
        let provider = TextractProvider::new(
            Client::new(),
            "us-east-1",
            "http://127.0.0.1:9/",
            None,
        );
        let err = provider
            .analyze_document(&document(b"\x89PNG"))
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::MissingCredentials));
    }

    #[tokio::test]
    async fn signed_request_returns_vendor_json_verbatim() {
        let captured: Arc<Mutex<Option<(AxumHeaders, Bytes)>>> = Arc::default();
        let sink = captured.clone();
        let router = Router::new().route(
            "/",
            post(move |headers: AxumHeaders, body: Bytes| {
                let sink = sink.clone();
                async move {
                    *sink.lock().unwrap() = Some((headers, body));
                    (
                        StatusCode::OK,
                        r#"{"DocumentMetadata":{"Pages":1},"Blocks":[{"BlockType":"PAGE","Id":"p1"}],"AnalyzeDocumentModelVersion":"1.0"}"#,
                    )
                }
            }),
        );
        let endpoint = spawn_mock(router).await;
        let provider = TextractProvider::new(Client::new(), "us-east-1", endpoint, test_credentials());

        let result = provider.analyze_document(&document(b"\x89PNGdata")).await.unwrap();
        assert_eq!(
            result,
            json!({
                "DocumentMetadata": {"Pages": 1},
                "Blocks": [{"BlockType": "PAGE", "Id": "p1"}],
                "AnalyzeDocumentModelVersion": "1.0"
            })
        );

        let (headers, body) = captured.lock().unwrap().take().unwrap();
        assert_eq!(headers["x-amz-target"], TARGET);
        assert_eq!(headers["content-type"], AMZ_JSON);
        assert!(
            headers["authorization"]
                .to_str()
                .unwrap()
                .starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/")
        );
        let sent: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(sent["FeatureTypes"], json!(["FORMS", "TABLES"]));
        let decoded = STANDARD.decode(sent["Document"]["Bytes"].as_str().unwrap()).unwrap();
        assert_eq!(decoded, b"\x89PNGdata");
    }

    #[tokio::test]
    async fn vendor_rejection_is_classified() {
        let router = Router::new().route(
            "/",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    [("x-amzn-ErrorType", "UnsupportedDocumentException:")],
                    r#"{"__type":"UnsupportedDocumentException","Message":"Request has unsupported document format"}"#,
                )
            }),
        );
        let endpoint = spawn_mock(router).await;
        let provider = TextractProvider::new(Client::new(), "us-east-1", endpoint, test_credentials());

        let err = provider.analyze_document(&document(b"junk")).await.unwrap_err();
        assert!(matches!(err, OcrError::Rejected { ref code, .. } if code == "UnsupportedDocumentException"));
    }
}
