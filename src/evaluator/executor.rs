// src/evaluator/executor.rs — Run generated source against literal test cases

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::sync::Arc;
use std::time::Duration;

use super::sandbox::{CallReply, LoadReply, Sandbox};
use crate::core::types::TestCase;

/// Pass/fail plus a human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutcome {
    pub passed: bool,
    pub message: String,
}

impl ExecOutcome {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }
}

/// Checks generated source against test cases. Never fails: every fault is
/// reported inside the outcome.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn execute(&self, source: &str, cases: &[TestCase]) -> ExecOutcome;
}

/// Executes each call in a fresh sandbox session.
pub struct SandboxExecutor {
    sandbox: Arc<dyn Sandbox>,
}

impl SandboxExecutor {
    pub fn new(sandbox: Arc<dyn Sandbox>) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl CodeExecutor for SandboxExecutor {
    async fn execute(&self, source: &str, cases: &[TestCase]) -> ExecOutcome {
        let mut session = match self.sandbox.open().await {
            Ok(session) => session,
            Err(e) => return ExecOutcome::fail(format!("sandbox error: {e}")),
        };

        match session.load(source).await {
            LoadReply::Loaded => {}
            LoadReply::SyntaxError(detail) => {
                return ExecOutcome::fail(format!("syntax error: {detail}"))
            }
            LoadReply::LoadError(detail) | LoadReply::Broken(detail) => {
                return ExecOutcome::fail(format!("load error: {detail}"))
            }
            LoadReply::TimedOut(limit) => {
                return ExecOutcome::fail(format!("load timed out after {}", secs(limit)))
            }
        }

        for case in cases {
            let name = &case.function;
            let args = case.arguments();
            let result = match session.call(name, &args).await {
                CallReply::Returned(value) => value,
                CallReply::Unrepresentable(repr) => {
                    return ExecOutcome::fail(mismatch(case, &repr));
                }
                CallReply::Missing => {
                    return ExecOutcome::fail(format!("function '{name}' not found"));
                }
                CallReply::NotCallable => {
                    return ExecOutcome::fail(format!("'{name}' is not a function"));
                }
                CallReply::Crashed(detail) | CallReply::Broken(detail) => {
                    return ExecOutcome::fail(format!("function crashed: {detail}"));
                }
                CallReply::TimedOut(limit) => {
                    return ExecOutcome::fail(format!(
                        "function timed out after {}",
                        secs(limit)
                    ));
                }
            };

            if !strict_eq(&result, &case.expected) {
                tracing::debug!(function = %name, "test case mismatch");
                return ExecOutcome::fail(mismatch(case, &render(&result)));
            }
        }

        ExecOutcome::pass("all tests passed")
    }
}

/// Structural equality where integers and floats never match each other.
/// Integers compare exactly at any magnitude, floats by value.
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_eq(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| strict_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| strict_eq(x, y)))
        }
        _ => a == b,
    }
}

fn numbers_eq(x: &Number, y: &Number) -> bool {
    match (integer_digits(x), integer_digits(y)) {
        (Some(i), Some(j)) => i == j,
        (None, None) => x.as_f64().is_some() && x.as_f64() == y.as_f64(),
        _ => false,
    }
}

/// Canonical decimal digits of an integral number, `None` for a float.
fn integer_digits(n: &Number) -> Option<String> {
    let text = n.to_string();
    if text.contains(['.', 'e', 'E']) {
        return None;
    }
    Some(if text == "-0" { "0".to_string() } else { text })
}

fn mismatch(case: &TestCase, shown: &str) -> String {
    format!(
        "test failed: {}({}) returned {}, expected {}",
        case.function,
        render_args(&case.input),
        shown,
        render(&case.expected)
    )
}

/// Compact JSON rendering of a value.
fn render(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

/// A sequence input shows as its comma-separated elements, a scalar as itself.
fn render_args(input: &Value) -> String {
    match input {
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(", "),
        other => render(other),
    }
}

fn secs(limit: Duration) -> String {
    format!("{}s", limit.as_secs_f64())
}
