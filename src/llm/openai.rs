//! OpenAI text generation.
//!
//! Implements the `TextGenerator` trait against the Chat Completions API.
//! One short retry on rate limits and server errors; the caller's per-call
//! timeout bounds the whole exchange.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use super::{GenerationRequest, TextGenerator};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const MAX_RETRIES: u32 = 1;
const BASE_BACKOFF_MS: u64 = 400;

const SYSTEM_PROMPT: &str = "You are a witty fantasy football columnist. \
    You write short, accurate weekly matchup recaps using only the facts you are given.";

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct OpenAiClient {
    http: Client,
    api_key: Secret<String>,
    model: String,
    base_url: String,
    total_calls: AtomicU64,
}

impl OpenAiClient {
    pub fn new(api_key: Secret<String>, model: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build OpenAI HTTP client")?;

        Ok(Self {
            http,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: OPENAI_API_URL.to_string(),
            total_calls: AtomicU64::new(0),
        })
    }

    /// Point the client at a different Chat Completions endpoint.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn call_api(&self, request: &GenerationRequest) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
        };

        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = BASE_BACKOFF_MS * 2u64.pow(attempt - 1);
                debug!(attempt, delay_ms = delay, "Retrying OpenAI call");
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            }

            let resp = self
                .http
                .post(&self.base_url)
                .bearer_auth(self.api_key.expose_secret())
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let parsed: ChatResponse = response
                            .json()
                            .await
                            .context("Failed to parse OpenAI response")?;
                        self.total_calls.fetch_add(1, Ordering::Relaxed);

                        let text = parsed
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|c| c.message)
                            .and_then(|m| m.content)
                            .unwrap_or_default();
                        let cleaned = clean_completion(&text);
                        if cleaned.is_empty() {
                            anyhow::bail!("OpenAI returned empty text");
                        }
                        return Ok(cleaned);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let error_text = response.text().await.unwrap_or_default();
                        warn!(status = %status, attempt, "Retryable OpenAI error");
                        last_error = Some(format!("HTTP {status}: {error_text}"));
                        continue;
                    }

                    let error_text = response.text().await.unwrap_or_default();
                    anyhow::bail!("OpenAI API error {status}: {error_text}");
                }
                Err(e) => {
                    warn!(attempt, error = %e, "OpenAI request failed");
                    last_error = Some(format!("Request error: {e}"));
                    continue;
                }
            }
        }

        anyhow::bail!(
            "OpenAI API failed after {MAX_RETRIES} retries: {}",
            last_error.unwrap_or_default()
        )
    }

    /// Total number of successful API calls made.
    pub fn total_calls(&self) -> u64 {
        self.total_calls.load(Ordering::Relaxed)
    }
}

/// Strip markdown code fences and surrounding whitespace.
pub fn clean_completion(text: &str) -> String {
    text.replace("```html", "")
        .replace("```markdown", "")
        .replace("```", "")
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// TextGenerator implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        debug!(model = %self.model, prompt_len = request.prompt.len(), "OpenAI generation");
        self.call_api(request).await
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> Secret<String> {
        Secret::new("test-key".to_string())
    }

    #[test]
    fn test_client_construction() {
        let client = OpenAiClient::new(key(), None).unwrap();
        assert_eq!(client.model_name(), DEFAULT_MODEL);
        assert_eq!(client.total_calls(), 0);
    }

    #[test]
    fn test_client_custom_model() {
        let client = OpenAiClient::new(key(), Some("gpt-4o".into())).unwrap();
        assert_eq!(client.model_name(), "gpt-4o");
    }

    #[test]
    fn test_clean_completion_strips_fences() {
        assert_eq!(clean_completion("```html\nHello there.\n```"), "Hello there.");
        assert_eq!(clean_completion("  plain  "), "plain");
        assert_eq!(clean_completion("```\n \n```"), "");
    }

    #[test]
    fn test_request_serialization() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            max_tokens: 280,
            temperature: 0.85,
            messages: vec![ChatMessage { role: "user", content: "hi" }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["max_tokens"], 280);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_response_without_content_parses() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant"}}]}"#).unwrap();
        assert!(parsed.choices[0].message.as_ref().unwrap().content.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_error() {
        let client = OpenAiClient::new(key(), None)
            .unwrap()
            .with_base_url("http://127.0.0.1:9/v1/chat/completions");
        let result = client.generate(&GenerationRequest::new("hello")).await;
        assert!(result.is_err());
    }
}
