// src/core/types.rs — Core domain types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::core::cost::StageMetrics;

/// Message recorded when the validator rejects and the executor is skipped.
pub const REJECTED_SENTINEL: &str = "rejected — unit test skipped";

/// Message recorded when a prompt carries no test cases.
pub const NO_TESTS_MESSAGE: &str = "no test cases, unit test skipped";

/// One literal check: call `function` with `input`, expect `expected`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub function: String,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub expected: Value,
}

impl TestCase {
    /// Positional arguments: a sequence input is spread, anything else is a
    /// single argument.
    pub fn arguments(&self) -> Vec<Value> {
        match &self.input {
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        }
    }
}

/// A benchmark prompt with its optional required function name and tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSpec {
    #[serde(default)]
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

impl PromptSpec {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            prompt: prompt.into(),
            function: None,
            test_cases: Vec::new(),
        }
    }

    pub fn with_function(mut self, name: impl Into<String>) -> Self {
        self.function = Some(name.into());
        self
    }

    pub fn with_tests(mut self, cases: Vec<TestCase>) -> Self {
        self.test_cases = cases;
        self
    }

    /// The function name to demand from the generator: the explicit one, or
    /// the name shared by the test cases.
    pub fn required_function(&self) -> Option<&str> {
        if let Some(name) = self.function.as_deref() {
            return Some(name);
        }
        self.test_cases.first().map(|c| c.function.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Single,
    TwoStage,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Single => write!(f, "single"),
            Mode::TwoStage => write!(f, "two-stage"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" | "single-stage" => Ok(Mode::Single),
            "two-stage" | "two_stage" | "dual" => Ok(Mode::TwoStage),
            other => Err(format!("unknown mode '{other}' (expected single or two-stage)")),
        }
    }
}

/// The validator's opinion of one generated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub approved: bool,
    pub reason: String,
}

impl Verdict {
    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Passed,
    TestFailed,
    Rejected,
    GenerationFailed,
}

/// One generate, optionally validate, then test cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// 1-based.
    pub index: u32,
    pub elapsed_secs: f64,
    pub tokens_in: u32,
    pub tokens_out: u32,
    pub cost: f64,
    /// `None` in single-stage mode or when generation failed.
    pub approved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_reason: Option<String>,
    pub test_passed: bool,
    pub test_message: String,
    pub outcome: AttemptOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<StageMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<StageMetrics>,
}

impl Attempt {
    pub fn tokens(&self) -> u64 {
        self.tokens_in as u64 + self.tokens_out as u64
    }
}

/// Final result of one prompt's retry loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub mode: Mode,
    pub prompt: String,
    pub passed: bool,
    pub attempt_count: u32,
    pub total_time_secs: f64,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub attempts: Vec<Attempt>,
    pub final_code: String,
}

impl Report {
    /// Aggregate the attempts into totals. `passed` follows the last attempt.
    pub fn from_attempts(
        mode: Mode,
        prompt: impl Into<String>,
        attempts: Vec<Attempt>,
        final_code: String,
    ) -> Self {
        Self {
            mode,
            prompt: prompt.into(),
            passed: attempts.last().is_some_and(|a| a.test_passed),
            attempt_count: attempts.len() as u32,
            total_time_secs: attempts.iter().fold(0.0, |acc, a| acc + a.elapsed_secs),
            total_tokens: attempts.iter().map(Attempt::tokens).sum(),
            total_cost: attempts.iter().fold(0.0, |acc, a| acc + a.cost),
            attempts,
            final_code,
        }
    }
}

/// Lifecycle notifications emitted by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    AttemptStart {
        attempt: u32,
        max_attempts: u32,
        mode: Mode,
    },
    Validated {
        attempt: u32,
        approved: bool,
        reason: String,
    },
    AttemptEnd {
        attempt: u32,
        passed: bool,
        message: String,
    },
    Complete {
        passed: bool,
        attempts: u32,
        total_time_secs: f64,
        total_cost: f64,
    },
}
