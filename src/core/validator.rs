// src/core/validator.rs — Validation adapter with fail-closed verdict parsing

use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::markdown;
use crate::core::prompts::PromptTemplates;
use crate::core::types::Verdict;
use crate::provider::{ChatRequest, ModelProvider};

/// One validation call and its verdict.
#[derive(Debug, Clone)]
pub struct Validation {
    pub verdict: Verdict,
    pub rendered_prompt: String,
    /// Empty when the call itself failed.
    pub raw_reply: String,
    pub elapsed: Duration,
}

pub struct Validator {
    provider: Arc<dyn ModelProvider>,
    model: String,
    templates: Arc<PromptTemplates>,
}

impl Validator {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        model: impl Into<String>,
        templates: Arc<PromptTemplates>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            templates,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the second model whether `code` satisfies `requirement`.
    ///
    /// Infallible: a failed call or an unreadable reply is a rejection.
    pub async fn validate(&self, requirement: &str, code: &str) -> Validation {
        let rendered_prompt = match self.templates.validation(requirement, code) {
            Ok(p) => p,
            Err(e) => {
                return Validation {
                    verdict: Verdict::reject(format!("validation prompt failed: {e}")),
                    rendered_prompt: String::new(),
                    raw_reply: String::new(),
                    elapsed: Duration::ZERO,
                }
            }
        };

        let start = Instant::now();
        let result = self
            .provider
            .chat(ChatRequest {
                model: self.model.clone(),
                prompt: rendered_prompt.clone(),
                temperature: Some(0.0),
            })
            .await;
        let elapsed = start.elapsed();

        let (verdict, raw_reply) = match result {
            Ok(response) => (parse_verdict(&response.content), response.content),
            Err(e) => {
                tracing::warn!(model = %self.model, "validation call failed: {e}");
                (Verdict::reject(format!("validation call failed: {e}")), String::new())
            }
        };

        tracing::debug!(
            model = %self.model,
            approved = verdict.approved,
            elapsed_ms = elapsed.as_millis() as u64,
            "validation complete"
        );

        Validation {
            verdict,
            rendered_prompt,
            raw_reply,
            elapsed,
        }
    }
}

/// Parse `{"valid": bool, "reason": string}`, optionally inside a fenced block.
///
/// Anything else (prose, malformed JSON, a missing or non-boolean `valid`)
/// yields a rejection.
pub fn parse_verdict(reply: &str) -> Verdict {
    let body = markdown::strip_fences(reply);
    let parsed: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => return Verdict::reject(format!("unparseable validator reply: {e}")),
    };

    let Some(approved) = parsed.get("valid").and_then(Value::as_bool) else {
        return Verdict::reject("validator reply lacks a boolean 'valid'");
    };

    let reason = match parsed.get("reason") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    Verdict { approved, reason }
}
