// src/core/cost.rs — Token estimation and linear price model

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Words-to-tokens ratio used by the estimator.
const TOKENS_PER_WORD: f64 = 1.3;

/// Approximate a token count as `round(words * 1.3)`, where words are
/// whitespace-delimited. Deterministic, not a real tokenizer.
pub fn estimate_tokens(text: &str) -> u32 {
    let words = text.split_whitespace().count();
    (words as f64 * TOKENS_PER_WORD).round() as u32
}

/// Linear cost with prices expressed per single token.
pub fn estimate_cost(tokens_in: u32, tokens_out: u32, price_in: f64, price_out: f64) -> f64 {
    tokens_in as f64 * price_in + tokens_out as f64 * price_out
}

/// Vendor price in USD per million tokens, split by direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

impl Price {
    pub const FREE: Price = Price {
        input_per_mtok: 0.0,
        output_per_mtok: 0.0,
    };

    pub const fn new(input_per_mtok: f64, output_per_mtok: f64) -> Self {
        Self {
            input_per_mtok,
            output_per_mtok,
        }
    }

    /// (input, output) price per single token.
    pub fn per_token(&self) -> (f64, f64) {
        (
            self.input_per_mtok / 1_000_000.0,
            self.output_per_mtok / 1_000_000.0,
        )
    }

    pub fn cost(&self, tokens_in: u32, tokens_out: u32) -> f64 {
        let (price_in, price_out) = self.per_token();
        estimate_cost(tokens_in, tokens_out, price_in, price_out)
    }
}

impl Default for Price {
    fn default() -> Self {
        Self::FREE
    }
}

/// Telemetry for one model call inside an attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageMetrics {
    pub model: String,
    pub elapsed_secs: f64,
    pub tokens_in: u32,
    pub tokens_out: u32,
    pub cost: f64,
}

impl StageMetrics {
    /// Estimate tokens on the text actually sent and received, then price them.
    pub fn measure(
        model: &str,
        price: &Price,
        prompt: &str,
        reply: &str,
        elapsed: Duration,
    ) -> Self {
        let tokens_in = estimate_tokens(prompt);
        let tokens_out = estimate_tokens(reply);
        Self {
            model: model.to_string(),
            elapsed_secs: elapsed.as_secs_f64(),
            tokens_in,
            tokens_out,
            cost: price.cost(tokens_in, tokens_out),
        }
    }
}
