// src/provider/openai.rs — OpenAI Chat API provider

use async_trait::async_trait;

use super::{status_error, ChatRequest, ChatResponse, ModelProvider, StopReason, TokenUsage};
use crate::infra::errors::BenchError;

pub struct OpenAIProvider {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl OpenAIProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, "https://api.openai.com/v1".into())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_request_body(request: &ChatRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": [{
                "role": "user",
                "content": request.prompt,
            }],
        });

        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        body
    }

    fn parse_response(resp: &serde_json::Value) -> ChatResponse {
        let choice = &resp["choices"][0];
        let content = choice["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();

        let usage = TokenUsage::from_counts(
            resp["usage"]["prompt_tokens"].as_u64(),
            resp["usage"]["completion_tokens"].as_u64(),
        );

        let stop_reason = match choice["finish_reason"].as_str() {
            Some("stop") => StopReason::EndTurn,
            Some("length") => StopReason::MaxTokens,
            Some("content_filter") => StopReason::Safety,
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
impl ModelProvider for OpenAIProvider {
    fn id(&self) -> &str {
        "openai"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, BenchError> {
        let body = Self::build_request_body(&request);

        tracing::debug!(model = %request.model, "openai chat/completions");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| BenchError::Provider {
                provider: "openai".into(),
                message: e.to_string(),
                retriable: e.is_timeout() || e.is_connect(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(status_error("openai", status, &error_body));
        }

        let resp: serde_json::Value = response.json().await.map_err(|e| BenchError::Provider {
            provider: "openai".into(),
            message: format!("Failed to parse response: {}", e),
            retriable: false,
        })?;

        Ok(Self::parse_response(&resp))
    }
}
