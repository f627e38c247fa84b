// src/infra/errors.rs — Error types for codegen-bench

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    // Provider errors (retriable)
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("Rate limited by '{provider}', retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    #[error("Unusable reply from '{provider}': {reason}")]
    UnusableReply { provider: String, reason: String },

    // User errors
    #[error("No API key for '{provider}'. Set {env_var}.")]
    MissingApiKey { provider: String, env_var: String },

    #[error("Unknown provider '{0}' (expected google or openai)")]
    UnknownProvider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // Infra
    #[error("Sandbox error: {0}")]
    Sandbox(String),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BenchError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            BenchError::Provider {
                retriable: true,
                ..
            } | BenchError::RateLimited { .. }
        )
    }
}
