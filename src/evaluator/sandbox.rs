// src/evaluator/sandbox.rs — Subprocess interpreter sessions for generated code
//
// Every session is a fresh `python3 -I` process running the embedded harness.
// Requests and replies are single JSON lines over the child's stdin/stdout.
// Both loading and each call are bounded by a timeout; on expiry the child is
// killed and the session refuses further work.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

use crate::infra::config::SandboxConfig;
use crate::infra::errors::BenchError;

const HARNESS: &str = include_str!("harness.py");

/// Outcome of loading source into a session.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadReply {
    Loaded,
    SyntaxError(String),
    /// The module body raised while executing.
    LoadError(String),
    TimedOut(Duration),
    Broken(String),
}

/// Outcome of invoking a named binding.
#[derive(Debug, Clone, PartialEq)]
pub enum CallReply {
    Returned(Value),
    /// The return value has no JSON form; carries the interpreter's repr.
    Unrepresentable(String),
    Missing,
    NotCallable,
    Crashed(String),
    TimedOut(Duration),
    Broken(String),
}

/// Opens isolated evaluation sessions.
#[async_trait]
pub trait Sandbox: Send + Sync {
    async fn open(&self) -> Result<Box<dyn Session>, BenchError>;
}

/// One isolated namespace. Dropping it discards all state.
#[async_trait]
pub trait Session: Send {
    async fn load(&mut self, source: &str) -> LoadReply;
    async fn call(&mut self, function: &str, args: &[Value]) -> CallReply;
}

#[derive(Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request<'a> {
    Load { source: &'a str },
    Call { function: &'a str, args: &'a [Value] },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Reply {
    Loaded,
    SyntaxError { detail: String },
    LoadError { detail: String },
    Returned { value: Value },
    Unrepresentable { repr: String },
    Missing,
    NotCallable,
    Crashed { detail: String },
    ProtocolError { detail: String },
}

/// Spawns the Python harness per session.
pub struct PythonSandbox {
    interpreter: PathBuf,
    load_timeout: Duration,
    call_timeout: Duration,
    stderr_limit: usize,
}

impl PythonSandbox {
    pub fn new(interpreter: PathBuf, load_timeout: Duration, call_timeout: Duration) -> Self {
        Self {
            interpreter,
            load_timeout,
            call_timeout,
            stderr_limit: 64 * 1024,
        }
    }

    /// Resolve the configured interpreter on PATH.
    pub fn from_config(config: &SandboxConfig) -> Result<Self, BenchError> {
        let interpreter = which::which(&config.interpreter).map_err(|e| {
            BenchError::Sandbox(format!("interpreter '{}' not found: {e}", config.interpreter))
        })?;
        Ok(Self {
            interpreter,
            load_timeout: Duration::from_secs(config.load_timeout_secs),
            call_timeout: Duration::from_secs(config.call_timeout_secs),
            stderr_limit: config.stderr_limit_bytes,
        })
    }

    pub fn interpreter(&self) -> &std::path::Path {
        &self.interpreter
    }
}

#[async_trait]
impl Sandbox for PythonSandbox {
    async fn open(&self) -> Result<Box<dyn Session>, BenchError> {
        let mut child = Command::new(&self.interpreter)
            .args(["-I", "-c", HARNESS])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                BenchError::Sandbox(format!("spawn {}: {e}", self.interpreter.display()))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BenchError::Sandbox("stdin was not piped".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BenchError::Sandbox("stdout was not piped".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| BenchError::Sandbox("stderr was not piped".into()))?;

        let captured = Arc::new(Mutex::new(Vec::new()));
        tokio::spawn(drain_stderr(stderr, captured.clone(), self.stderr_limit));

        tracing::debug!(pid = ?child.id(), "sandbox session opened");
        Ok(Box::new(PythonSession {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            stderr: captured,
            load_timeout: self.load_timeout,
            call_timeout: self.call_timeout,
            dead: None,
        }))
    }
}

/// Keep the first `limit` bytes of stderr and discard the rest while still
/// draining the pipe.
async fn drain_stderr(mut stderr: ChildStderr, sink: Arc<Mutex<Vec<u8>>>, limit: usize) {
    let mut chunk = [0u8; 4096];
    loop {
        match stderr.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if let Ok(mut buf) = sink.lock() {
                    let room = limit.saturating_sub(buf.len());
                    buf.extend_from_slice(&chunk[..n.min(room)]);
                }
            }
        }
    }
}

struct PythonSession {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    stderr: Arc<Mutex<Vec<u8>>>,
    load_timeout: Duration,
    call_timeout: Duration,
    /// Set once the child is killed or the channel breaks.
    dead: Option<String>,
}

enum Exchange {
    Reply(Reply),
    TimedOut(Duration),
    Broken(String),
}

impl PythonSession {
    async fn exchange(&mut self, request: &Request<'_>, limit: Duration) -> Exchange {
        if let Some(reason) = &self.dead {
            return Exchange::Broken(reason.clone());
        }

        let mut line = match serde_json::to_string(request) {
            Ok(line) => line,
            Err(e) => return Exchange::Broken(format!("encode request: {e}")),
        };
        line.push('\n');

        let outcome = tokio::time::timeout(limit, self.round_trip(&line)).await;
        match outcome {
            Ok(Ok(reply)) => Exchange::Reply(reply),
            Ok(Err(reason)) => {
                self.dead = Some(reason.clone());
                Exchange::Broken(reason)
            }
            Err(_) => {
                tracing::warn!(timeout_secs = limit.as_secs_f64(), "sandbox call timed out, killing");
                let _ = self.child.start_kill();
                self.dead = Some(format!("session killed after {}s timeout", limit.as_secs_f64()));
                Exchange::TimedOut(limit)
            }
        }
    }

    async fn round_trip(&mut self, line: &str) -> Result<Reply, String> {
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| format!("write request: {e}"))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| format!("flush request: {e}"))?;

        let mut reply = String::new();
        let read = self
            .stdout
            .read_line(&mut reply)
            .await
            .map_err(|e| format!("read reply: {e}"))?;
        if read == 0 {
            return Err(self.exit_diagnostic());
        }
        serde_json::from_str(&reply).map_err(|e| format!("malformed reply ({e}): {}", reply.trim()))
    }

    /// Describe an unexpected interpreter exit with the tail of its stderr.
    fn exit_diagnostic(&mut self) -> String {
        let status = match self.child.try_wait() {
            Ok(Some(status)) => status.to_string(),
            _ => "closed its output".to_string(),
        };
        let tail = self
            .stderr
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).trim().to_string())
            .unwrap_or_default();
        let tail = last_line(&tail);
        if tail.is_empty() {
            format!("interpreter exited ({status})")
        } else {
            format!("interpreter exited ({status}): {tail}")
        }
    }
}

fn last_line(text: &str) -> &str {
    text.lines().last().unwrap_or("").trim()
}

#[async_trait]
impl Session for PythonSession {
    async fn load(&mut self, source: &str) -> LoadReply {
        let limit = self.load_timeout;
        match self.exchange(&Request::Load { source }, limit).await {
            Exchange::Reply(Reply::Loaded) => LoadReply::Loaded,
            Exchange::Reply(Reply::SyntaxError { detail }) => LoadReply::SyntaxError(detail),
            Exchange::Reply(Reply::LoadError { detail }) => LoadReply::LoadError(detail),
            Exchange::Reply(other) => LoadReply::Broken(format!("unexpected reply to load: {other:?}")),
            Exchange::TimedOut(limit) => LoadReply::TimedOut(limit),
            Exchange::Broken(reason) => LoadReply::Broken(reason),
        }
    }

    async fn call(&mut self, function: &str, args: &[Value]) -> CallReply {
        let limit = self.call_timeout;
        let request = Request::Call { function, args };
        match self.exchange(&request, limit).await {
            Exchange::Reply(Reply::Returned { value }) => CallReply::Returned(value),
            Exchange::Reply(Reply::Unrepresentable { repr }) => CallReply::Unrepresentable(repr),
            Exchange::Reply(Reply::Missing) => CallReply::Missing,
            Exchange::Reply(Reply::NotCallable) => CallReply::NotCallable,
            Exchange::Reply(Reply::Crashed { detail }) => CallReply::Crashed(detail),
            Exchange::Reply(other) => CallReply::Broken(format!("unexpected reply to call: {other:?}")),
            Exchange::TimedOut(limit) => CallReply::TimedOut(limit),
            Exchange::Broken(reason) => CallReply::Broken(reason),
        }
    }
}
