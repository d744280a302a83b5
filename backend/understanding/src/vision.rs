//! Vision understanding via an OpenAI-compatible chat completions API.
//!
//! One user message carries the prompt text and a single image as a `data:` URI.
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use formlens_core::{VisionProvider, VisionRequest, VisionResponse};
use logging::redact_sensitive_data;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const PROVIDER_NAME: &str = "openai";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

/// OpenAI multimodal provider. The HTTP client is shared with the rest of the process.
pub struct OpenAiVisionProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiVisionProvider {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl VisionProvider for OpenAiVisionProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse> {
        info!(model = %request.model, "[Vision] Requesting header analysis");
        let start = Instant::now();

        let body = ChatRequest {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: &request.prompt,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: &request.image_data_uri,
                        },
                    },
                ],
            }],
            max_tokens: request.max_tokens,
        };

        let resp = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("OpenAI request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("OpenAI vision error ({}): {}", status, redact_sensitive_data(&text));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("OpenAI response contained no message content"))?;

        let latency_ms = start.elapsed().as_millis() as u64;
        info!(latency_ms, chars = content.len(), "[Vision] Reply received");

        Ok(VisionResponse {
            content,
            provider: PROVIDER_NAME.to_string(),
            model: request.model.clone(),
            tokens_used: parsed.usage.map(|u| u.total_tokens).unwrap_or(0),
            latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::post};
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    async fn spawn_mock(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1/")
    }

    fn request() -> VisionRequest {
        VisionRequest {
            model: "gpt-4o".into(),
            prompt: "label the headers".into(),
            image_data_uri: "data:image/jpeg;base64,AAAA".into(),
            max_tokens: 4096,
        }
    }

    #[tokio::test]
    async fn sends_text_and_image_parts() {
        let seen: Arc<Mutex<Option<(HeaderMap, Value)>>> = Arc::default();
        let sink = seen.clone();
        let router = Router::new().route(
            "/v1/chat/completions",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    *sink.lock().unwrap() = Some((headers, body));
                    Json(json!({
                        "choices": [{"message": {"role": "assistant", "content": "```json\n[]\n```"}}],
                        "usage": {"total_tokens": 42}
                    }))
                }
            }),
        );
        let base = spawn_mock(router).await;
        let provider = OpenAiVisionProvider::new(Client::new(), "sk-test").with_base_url(base);

        let reply = provider.complete(&request()).await.unwrap();
        assert_eq!(reply.content, "```json\n[]\n```");
        assert_eq!(reply.tokens_used, 42);
        assert_eq!(reply.provider, "openai");

        let (headers, body) = seen.lock().unwrap().take().unwrap();
        assert_eq!(headers["authorization"], "Bearer sk-test");
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 4096);
        let parts = &body["messages"][0]["content"];
        assert_eq!(parts[0], json!({"type": "text", "text": "label the headers"}));
        assert_eq!(
            parts[1],
            json!({"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,AAAA"}})
        );
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::UNAUTHORIZED, "Incorrect API key provided: sk-abcdefghijklmnopqrstu") }),
        );
        let base = spawn_mock(router).await;
        let provider = OpenAiVisionProvider::new(Client::new(), "sk-bad").with_base_url(base);

        let err = provider.complete(&request()).await.unwrap_err().to_string();
        assert!(err.contains("401"));
        assert!(!err.contains("sk-abcdefghijklmnopqrstu"));
    }

    #[tokio::test]
    async fn missing_content_is_an_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({"choices": []})) }),
        );
        let base = spawn_mock(router).await;
        let provider = OpenAiVisionProvider::new(Client::new(), "sk-test").with_base_url(base);

        assert!(provider.complete(&request()).await.is_err());
    }
}
