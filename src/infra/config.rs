// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::cost::Price;
use crate::infra::errors::BenchError;
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub pricing: PricingConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub sandbox: SandboxConfig,

    #[serde(default)]
    pub bench: BenchConfig,
}

/// Model references in `provider/model` form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub generator: String,
    pub validator: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            generator: "google/gemini-2.0-flash-exp".into(),
            validator: "openai/gpt-4o-mini".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub generator: Price,
    pub validator: Price,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            // The experimental flash model is billed at zero.
            generator: Price::new(0.0, 0.0),
            validator: Price::new(0.15, 0.60),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Interpreter binary, resolved on PATH.
    pub interpreter: String,
    pub load_timeout_secs: u64,
    pub call_timeout_secs: u64,
    /// Cap on captured interpreter stderr.
    pub stderr_limit_bytes: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".into(),
            load_timeout_secs: 10,
            call_timeout_secs: 10,
            stderr_limit_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub pause_between_runs_ms: u64,
    pub pause_between_prompts_ms: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            pause_between_runs_ms: 1000,
            pause_between_prompts_ms: 2000,
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        match paths::config_file_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        if self.retry.max_attempts == 0 {
            return Err(BenchError::Config(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.sandbox.load_timeout_secs == 0 || self.sandbox.call_timeout_secs == 0 {
            return Err(BenchError::Config(
                "sandbox timeouts must be greater than zero".into(),
            ));
        }
        if self.sandbox.interpreter.trim().is_empty() {
            return Err(BenchError::Config("sandbox.interpreter is empty".into()));
        }
        for (name, price) in [
            ("generator", &self.pricing.generator),
            ("validator", &self.pricing.validator),
        ] {
            let valid = |v: f64| v.is_finite() && v >= 0.0;
            if !valid(price.input_per_mtok) || !valid(price.output_per_mtok) {
                return Err(BenchError::Config(format!(
                    "pricing.{name} must be a non-negative number"
                )));
            }
        }
        Ok(())
    }
}
