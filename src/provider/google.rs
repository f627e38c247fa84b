// src/provider/google.rs — Google Generative AI (Gemini) provider

use async_trait::async_trait;

use super::{status_error, ChatRequest, ChatResponse, ModelProvider, StopReason, TokenUsage};
use crate::infra::errors::BenchError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GoogleProvider {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl GoogleProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.into())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build the Gemini request body from a ChatRequest.
    fn build_request_body(request: &ChatRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }],
            }],
        });

        if let Some(temp) = request.temperature {
            body["generationConfig"] = serde_json::json!({ "temperature": temp });
        }

        body
    }

    fn parse_response(resp: &serde_json::Value) -> ChatResponse {
        let content = resp["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<String>()
            })
            .unwrap_or_default();

        let usage = TokenUsage::from_counts(
            resp["usageMetadata"]["promptTokenCount"].as_u64(),
            resp["usageMetadata"]["candidatesTokenCount"].as_u64(),
        );

        let stop_reason = match resp["candidates"][0]["finishReason"].as_str() {
            Some("STOP") => StopReason::EndTurn,
            Some("MAX_TOKENS") => StopReason::MaxTokens,
            Some("SAFETY") => StopReason::Safety,
            _ => StopReason::Unknown,
        };

        ChatResponse {
            content,
            usage,
            stop_reason,
        }
    }
}

#[async_trait]
impl ModelProvider for GoogleProvider {
    fn id(&self) -> &str {
        "google"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, BenchError> {
        let body = Self::build_request_body(&request);

        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);

        tracing::debug!(model = %request.model, "google generateContent");
        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BenchError::Provider {
                provider: "google".into(),
                message: e.to_string(),
                retriable: e.is_timeout() || e.is_connect(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(status_error("google", status, &error_body));
        }

        let resp: serde_json::Value = response.json().await.map_err(|e| BenchError::Provider {
            provider: "google".into(),
            message: format!("Failed to parse response: {}", e),
            retriable: false,
        })?;

        let parsed = Self::parse_response(&resp);
        if parsed.content.is_empty() {
            let reason = resp["promptFeedback"]["blockReason"]
                .as_str()
                .or_else(|| resp["candidates"][0]["finishReason"].as_str())
                .unwrap_or("no candidates");
            return Err(BenchError::Provider {
                provider: "google".into(),
                message: format!("empty response ({reason})"),
                retriable: false,
            });
        }
        Ok(parsed)
    }
}
