// tests/executor_test.rs — Integration test: generated code against a real interpreter
//
// Each test returns early when no python3 is on PATH.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use codegen_bench::core::types::TestCase;
use codegen_bench::evaluator::{CodeExecutor, PythonSandbox, SandboxExecutor};

fn python() -> Option<PathBuf> {
    which::which("python3").ok()
}

fn executor_with(python: PathBuf, call_timeout: Duration) -> SandboxExecutor {
    let sandbox = PythonSandbox::new(python, Duration::from_secs(10), call_timeout);
    SandboxExecutor::new(Arc::new(sandbox))
}

fn executor(python: PathBuf) -> SandboxExecutor {
    executor_with(python, Duration::from_secs(10))
}

fn case(function: &str, input: Value, expected: Value) -> TestCase {
    TestCase {
        function: function.into(),
        input,
        expected,
    }
}

const DOUBLE: &str = "def f(x):\n    return x * 2\n";

#[tokio::test]
async fn test_matching_result_passes() {
    let Some(py) = python() else { return };
    let outcome = executor(py)
        .execute(DOUBLE, &[case("f", json!(5), json!(10))])
        .await;
    assert!(outcome.passed, "{}", outcome.message);
    assert_eq!(outcome.message, "all tests passed");
}

#[tokio::test]
async fn test_mismatch_names_actual_and_expected() {
    let Some(py) = python() else { return };
    let outcome = executor(py)
        .execute(DOUBLE, &[case("f", json!(5), json!(11))])
        .await;
    assert!(!outcome.passed);
    assert_eq!(outcome.message, "test failed: f(5) returned 10, expected 11");
}

#[tokio::test]
async fn test_stops_at_first_failing_case() {
    let Some(py) = python() else { return };
    let cases = [
        case("f", json!(1), json!(2)),
        case("f", json!(2), json!(5)),
        case("f", json!(3), json!(7)),
    ];
    let outcome = executor(py).execute(DOUBLE, &cases).await;
    assert_eq!(outcome.message, "test failed: f(2) returned 4, expected 5");
}

#[tokio::test]
async fn test_sequence_input_is_spread() {
    let Some(py) = python() else { return };
    let source = "def add(a, b):\n    return a + b\n";
    let outcome = executor(py)
        .execute(source, &[case("add", json!([2, 3]), json!(5))])
        .await;
    assert!(outcome.passed, "{}", outcome.message);
}

#[tokio::test]
async fn test_structured_values_compare_exactly() {
    let Some(py) = python() else { return };
    let source = "def pairs(n):\n    return {'n': n, 'items': list(range(n)), 'none': None}\n";
    let expected = json!({"n": 3, "items": [0, 1, 2], "none": null});
    let outcome = executor(py)
        .execute(source, &[case("pairs", json!(3), expected)])
        .await;
    assert!(outcome.passed, "{}", outcome.message);
}

#[tokio::test]
async fn test_missing_function() {
    let Some(py) = python() else { return };
    let outcome = executor(py)
        .execute(DOUBLE, &[case("g", json!(5), json!(10))])
        .await;
    assert!(!outcome.passed);
    assert_eq!(outcome.message, "function 'g' not found");
}

#[tokio::test]
async fn test_non_callable_binding() {
    let Some(py) = python() else { return };
    let outcome = executor(py)
        .execute("f = 42\n", &[case("f", json!(5), json!(10))])
        .await;
    assert_eq!(outcome.message, "'f' is not a function");
}

#[tokio::test]
async fn test_syntax_error_is_reported() {
    let Some(py) = python() else { return };
    let outcome = executor(py)
        .execute("def f(x)\n    return x\n", &[case("f", json!(1), json!(1))])
        .await;
    assert!(!outcome.passed);
    assert!(outcome.message.starts_with("syntax error:"), "{}", outcome.message);
}

#[tokio::test]
async fn test_module_level_raise_is_load_error() {
    let Some(py) = python() else { return };
    let outcome = executor(py)
        .execute("raise RuntimeError('boom')\n", &[case("f", json!(1), json!(1))])
        .await;
    assert_eq!(outcome.message, "load error: RuntimeError: boom");
}

#[tokio::test]
async fn test_crash_is_reported() {
    let Some(py) = python() else { return };
    let source = "def f(x):\n    return x / 0\n";
    let outcome = executor(py)
        .execute(source, &[case("f", json!(1), json!(1))])
        .await;
    assert!(!outcome.passed);
    assert!(
        outcome.message.starts_with("function crashed: ZeroDivisionError"),
        "{}",
        outcome.message
    );
}

#[tokio::test]
async fn test_bool_is_not_int() {
    let Some(py) = python() else { return };
    let source = "def is_even(n):\n    return n % 2 == 0\n";
    let outcome = executor(py)
        .execute(source, &[case("is_even", json!(4), json!(1))])
        .await;
    assert!(!outcome.passed);
    assert_eq!(outcome.message, "test failed: is_even(4) returned true, expected 1");
}

#[tokio::test]
async fn test_float_is_not_int() {
    let Some(py) = python() else { return };
    let source = "def half(n):\n    return n / 2\n";
    let outcome = executor(py)
        .execute(source, &[case("half", json!(4), json!(2))])
        .await;
    assert!(!outcome.passed);
    assert_eq!(outcome.message, "test failed: half(4) returned 2.0, expected 2");
}

fn number(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}

#[tokio::test]
async fn test_big_integers_compare_exactly() {
    let Some(py) = python() else { return };
    let exec = executor(py);
    let source = "def f(x):\n    return 2**64 + x\n";

    let off_by_one = exec
        .execute(source, &[case("f", json!(1), number("18446744073709551616"))])
        .await;
    assert!(!off_by_one.passed);
    assert_eq!(
        off_by_one.message,
        "test failed: f(1) returned 18446744073709551617, expected 18446744073709551616"
    );

    let exact = exec
        .execute(source, &[case("f", json!(1), number("18446744073709551617"))])
        .await;
    assert!(exact.passed, "{}", exact.message);
}

#[tokio::test]
async fn test_float_is_not_big_int() {
    let Some(py) = python() else { return };
    let source = "import math\n\ndef fact(n):\n    return math.gamma(n + 1)\n";
    let outcome = executor(py)
        .execute(source, &[case("fact", json!(21), number("51090942171709440000"))])
        .await;
    assert!(!outcome.passed, "{}", outcome.message);
    assert!(outcome.message.ends_with("expected 51090942171709440000"));
}

#[tokio::test]
async fn test_unrepresentable_result_shows_repr() {
    let Some(py) = python() else { return };
    let source = "def f(x):\n    return {x}\n";
    let outcome = executor(py)
        .execute(source, &[case("f", json!(1), json!([1]))])
        .await;
    assert_eq!(outcome.message, "test failed: f(1) returned {1}, expected [1]");
}

#[tokio::test]
async fn test_printing_does_not_corrupt_protocol() {
    let Some(py) = python() else { return };
    let source = "print('loading')\ndef f(x):\n    print('called with', x)\n    return x\n";
    let outcome = executor(py)
        .execute(source, &[case("f", json!("a"), json!("a"))])
        .await;
    assert!(outcome.passed, "{}", outcome.message);
}

#[tokio::test]
async fn test_runaway_call_times_out() {
    let Some(py) = python() else { return };
    let source = "def f(x):\n    while True:\n        pass\n";
    let outcome = executor_with(py, Duration::from_millis(500))
        .execute(source, &[case("f", json!(1), json!(1))])
        .await;
    assert!(!outcome.passed);
    assert_eq!(outcome.message, "function timed out after 0.5s");
}

#[tokio::test]
async fn test_each_execution_gets_a_fresh_namespace() {
    let Some(py) = python() else { return };
    let exec = executor(py);
    let first = exec
        .execute("def g(x):\n    return x\n", &[case("g", json!(1), json!(1))])
        .await;
    assert!(first.passed, "{}", first.message);

    let second = exec
        .execute("def h(x):\n    return x\n", &[case("g", json!(1), json!(1))])
        .await;
    assert_eq!(second.message, "function 'g' not found");
}

#[tokio::test]
async fn test_missing_interpreter_is_sandbox_error() {
    let sandbox = PythonSandbox::new(
        PathBuf::from("/nonexistent/python3"),
        Duration::from_secs(1),
        Duration::from_secs(1),
    );
    let outcome = SandboxExecutor::new(Arc::new(sandbox))
        .execute(DOUBLE, &[case("f", json!(5), json!(10))])
        .await;
    assert!(!outcome.passed);
    assert!(outcome.message.starts_with("sandbox error:"), "{}", outcome.message);
}
