// src/core/generator.rs — Generation adapter: requirement in, source code out

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::markdown;
use crate::core::prompts::PromptTemplates;
use crate::infra::errors::BenchError;
use crate::provider::{ChatRequest, ModelProvider, StopReason};

/// One generation call and what it produced.
#[derive(Debug, Clone)]
pub struct Generation {
    pub code: String,
    pub rendered_prompt: String,
    pub raw_reply: String,
    pub elapsed: Duration,
}

pub struct Generator {
    provider: Arc<dyn ModelProvider>,
    model: String,
    templates: Arc<PromptTemplates>,
    temperature: Option<f32>,
}

impl Generator {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        model: impl Into<String>,
        templates: Arc<PromptTemplates>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            templates,
            temperature: None,
        }
    }

    /// Pin the sampling temperature. Unset leaves the vendor default.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Render the template, call the model once, and keep the first fenced
    /// block (or the trimmed reply when there is none). Never retries.
    pub async fn generate(
        &self,
        requirement: &str,
        function: Option<&str>,
    ) -> Result<Generation, BenchError> {
        let rendered_prompt = self.templates.generation(requirement, function)?;

        let start = Instant::now();
        let response = self
            .provider
            .chat(ChatRequest {
                model: self.model.clone(),
                prompt: rendered_prompt.clone(),
                temperature: self.temperature,
            })
            .await?;
        let elapsed = start.elapsed();

        tracing::debug!(
            provider = self.provider.id(),
            model = %self.model,
            elapsed_ms = elapsed.as_millis() as u64,
            vendor_tokens = response.usage.total(),
            "generation complete"
        );

        if response.stop_reason == StopReason::Safety {
            return Err(self.unusable("stopped by safety filter"));
        }
        let code = markdown::strip_fences(&response.content);
        if code.is_empty() {
            return Err(self.unusable("reply contains no code"));
        }

        Ok(Generation {
            code,
            rendered_prompt,
            raw_reply: response.content,
            elapsed,
        })
    }

    fn unusable(&self, reason: &str) -> BenchError {
        BenchError::UnusableReply {
            provider: self.provider.id().to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChatResponse, MockModelProvider, StopReason};

    fn generator(mock: MockModelProvider) -> Generator {
        Generator::new(
            Arc::new(mock),
            "gemini-2.0-flash-exp",
            Arc::new(PromptTemplates::new().unwrap()),
        )
    }

    #[tokio::test]
    async fn test_extracts_fenced_block() {
        let mut mock = MockModelProvider::new();
        mock.expect_id().return_const("google".to_string());
        mock.expect_chat().times(1).returning(|_| {
            Ok(ChatResponse::text(
                "Sure:\n```python\ndef f(x):\n    return x * 2\n```\nDone.",
            ))
        });

        let g = generator(mock).generate("double x", Some("f")).await.unwrap();
        assert_eq!(g.code, "def f(x):\n    return x * 2");
        assert!(g.raw_reply.starts_with("Sure:"));
        assert!(g.rendered_prompt.contains("named exactly `f`"));
    }

    #[tokio::test]
    async fn test_unfenced_reply_is_trimmed() {
        let mut mock = MockModelProvider::new();
        mock.expect_id().return_const("google".to_string());
        mock.expect_chat()
            .returning(|_| Ok(ChatResponse::text("\n\ndef f(x): return x\n  ")));

        let g = generator(mock).generate("identity", None).await.unwrap();
        assert_eq!(g.code, "def f(x): return x");
    }

    #[tokio::test]
    async fn test_sends_rendered_prompt_to_configured_model() {
        let mut mock = MockModelProvider::new();
        mock.expect_id().return_const("google".to_string());
        mock.expect_chat()
            .withf(|req| {
                req.model == "gemini-2.0-flash-exp"
                    && req.temperature == Some(0.0)
                    && req.prompt.contains("Requirement: add two numbers")
            })
            .times(1)
            .returning(|_| Ok(ChatResponse::text("def add(a, b): return a + b")));

        let g = generator(mock).with_temperature(0.0);
        assert_eq!(g.model(), "gemini-2.0-flash-exp");
        g.generate("add two numbers", Some("add")).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_reply_is_unusable() {
        for reply in ["", "   \n", "```python\n```"] {
            let mut mock = MockModelProvider::new();
            mock.expect_id().return_const("google".to_string());
            mock.expect_chat()
                .returning(move |_| Ok(ChatResponse::text(reply)));

            let err = generator(mock).generate("merge sort", None).await.unwrap_err();
            assert!(
                matches!(err, BenchError::UnusableReply { ref provider, .. } if provider == "google"),
                "{err}"
            );
        }
    }

    #[tokio::test]
    async fn test_safety_stop_is_unusable() {
        let mut mock = MockModelProvider::new();
        mock.expect_id().return_const("google".to_string());
        mock.expect_chat().returning(|_| {
            Ok(ChatResponse {
                stop_reason: StopReason::Safety,
                ..ChatResponse::text("def f(x):\n    return")
            })
        });

        let err = generator(mock).generate("x", None).await.unwrap_err();
        assert!(err.to_string().contains("safety"));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let mut mock = MockModelProvider::new();
        mock.expect_chat().returning(|_| {
            Err(BenchError::Provider {
                provider: "google".into(),
                message: "HTTP 500".into(),
                retriable: true,
            })
        });

        let err = generator(mock).generate("x", None).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }
}
