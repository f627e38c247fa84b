// src/provider/resolver.rs — Build provider clients from model refs and env keys

use std::sync::Arc;

use super::google::GoogleProvider;
use super::openai::OpenAIProvider;
use super::{ModelProvider, ModelRef};
use crate::infra::errors::BenchError;

/// Env vars consulted, in order, for each provider's API key.
fn key_vars(provider: &str) -> &'static [&'static str] {
    match provider {
        "google" | "gemini" => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
        "openai" => &["OPENAI_API_KEY"],
        _ => &[],
    }
}

fn resolve_key(provider: &str) -> Result<String, BenchError> {
    let vars = key_vars(provider);
    for var in vars {
        if let Ok(key) = std::env::var(var) {
            if !key.trim().is_empty() {
                return Ok(key);
            }
        }
    }
    Err(BenchError::MissingApiKey {
        provider: provider.into(),
        env_var: vars.join(" or "),
    })
}

/// Construct the client for `model_ref.provider`. Each call builds a new
/// instance; callers share it through the returned `Arc`.
pub fn build_provider(model_ref: &ModelRef) -> Result<Arc<dyn ModelProvider>, BenchError> {
    match model_ref.provider.as_str() {
        "google" | "gemini" => {
            let key = resolve_key("google")?;
            let provider = match std::env::var("GEMINI_BASE_URL") {
                Ok(url) => GoogleProvider::with_base_url(key, url),
                Err(_) => GoogleProvider::new(key),
            };
            Ok(Arc::new(provider))
        }
        "openai" => {
            let key = resolve_key("openai")?;
            let provider = match std::env::var("OPENAI_BASE_URL") {
                Ok(url) => OpenAIProvider::with_base_url(key, url),
                Err(_) => OpenAIProvider::new(key),
            };
            Ok(Arc::new(provider))
        }
        other => Err(BenchError::UnknownProvider(other.into())),
    }
}

/// Parse a `provider/model` string, reporting a config error on bad input.
pub fn parse_model_ref(s: &str) -> Result<ModelRef, BenchError> {
    ModelRef::parse(s)
        .ok_or_else(|| BenchError::Config(format!("invalid model '{s}', expected provider/model")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider() {
        let err = build_provider(&ModelRef::new("acme", "m1")).err().unwrap();
        assert!(matches!(err, BenchError::UnknownProvider(ref p) if p == "acme"));
    }

    #[test]
    fn test_key_vars() {
        assert_eq!(key_vars("google"), &["GEMINI_API_KEY", "GOOGLE_API_KEY"]);
        assert_eq!(key_vars("gemini"), key_vars("google"));
        assert_eq!(key_vars("openai"), &["OPENAI_API_KEY"]);
        assert!(key_vars("acme").is_empty());
    }

    #[test]
    fn test_parse_model_ref() {
        assert_eq!(
            parse_model_ref("openai/gpt-4o-mini").unwrap(),
            ModelRef::new("openai", "gpt-4o-mini")
        );
        let err = parse_model_ref("gpt-4o-mini").unwrap_err();
        assert!(err.to_string().contains("provider/model"));
    }
}
