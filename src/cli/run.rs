// src/cli/run.rs — Single prompt execution (`codegen-bench run`)

use std::path::Path;

use super::progress::terminal_progress;
use crate::core::orchestrator::Orchestrator;
use crate::core::types::{Mode, PromptSpec, TestCase};

/// Read a JSON list of test cases.
pub fn load_cases(path: &Path) -> anyhow::Result<Vec<TestCase>> {
    let content = std::fs::read_to_string(path)?;
    let cases: Vec<TestCase> = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("invalid test cases in {}: {e}", path.display()))?;
    Ok(cases)
}

pub async fn run_prompt(
    orchestrator: Orchestrator,
    mode: Mode,
    spec: PromptSpec,
    quiet: bool,
) -> anyhow::Result<()> {
    let orchestrator = if quiet {
        orchestrator
    } else {
        orchestrator.with_progress(terminal_progress())
    };

    let report = orchestrator.run(mode, &spec).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.passed {
        tracing::info!(attempts = report.attempt_count, "prompt did not pass");
    }
    Ok(())
}
