// src/evaluator/mod.rs — Sandboxed execution of generated code against test cases

pub mod executor;
pub mod sandbox;

pub use executor::{CodeExecutor, ExecOutcome, SandboxExecutor};
pub use sandbox::{PythonSandbox, Sandbox, Session};
