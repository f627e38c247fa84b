// src/cli/bench.rs — Strategy comparison over a prompt bank (`codegen-bench bench`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;

use crate::core::bank::PromptBank;
use crate::core::benchmark::{
    summarize, BenchmarkExport, BenchmarkRow, BenchmarkSummary, PromptError, RunStats,
};
use crate::core::orchestrator::Orchestrator;
use crate::core::types::{Mode, PromptSpec, Report};
use crate::infra::config::Config;
use crate::infra::paths;

pub struct BenchOptions {
    pub output: Option<PathBuf>,
    pub save: bool,
    pub limit: Option<usize>,
    pub no_pause: bool,
    pub quiet: bool,
}

pub async fn run_bench(
    orchestrator: &Orchestrator,
    config: &Config,
    bank_path: &Path,
    opts: BenchOptions,
) -> anyhow::Result<()> {
    let bank = PromptBank::load(bank_path)?;
    if bank.is_empty() {
        anyhow::bail!("prompt bank {} has no prompts", bank_path.display());
    }

    let (run_pause, prompt_pause) = if opts.no_pause {
        (Duration::ZERO, Duration::ZERO)
    } else {
        (
            Duration::from_millis(config.bench.pause_between_runs_ms),
            Duration::from_millis(config.bench.pause_between_prompts_ms),
        )
    };

    let run_id = uuid::Uuid::new_v4();
    let started_at = Utc::now();
    let prompts: Vec<&PromptSpec> = bank
        .prompts
        .iter()
        .take(opts.limit.unwrap_or(usize::MAX))
        .collect();
    let total = prompts.len();

    tracing::info!(%run_id, prompts = total, "starting benchmark");

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (i, spec) in prompts.iter().enumerate() {
        if !opts.quiet {
            eprintln!("[{}/{}] {}: {}", i + 1, total, spec.id, preview(&spec.prompt, 60));
        }

        match compare(orchestrator, spec, run_pause).await {
            Ok((single, dual)) => {
                if !opts.quiet {
                    eprintln!("  {}", stats_line("single:", &RunStats::from(&single)));
                    eprintln!("  {}", stats_line("two-stage:", &RunStats::from(&dual)));
                }
                rows.push(BenchmarkRow::new(spec.id.clone(), &single, &dual));
            }
            Err(e) => {
                eprintln!("  ERROR: {e}");
                errors.push(PromptError {
                    id: spec.id.clone(),
                    message: e.to_string(),
                });
            }
        }

        if i + 1 < total && !prompt_pause.is_zero() {
            tokio::time::sleep(prompt_pause).await;
        }
    }

    let summary = summarize(&rows, errors.len());
    println!("{}", render_summary(&summary));

    let export = BenchmarkExport {
        run_id,
        started_at,
        finished_at: Utc::now(),
        generator: config.models.generator.clone(),
        validator: config.models.validator.clone(),
        max_attempts: config.retry.max_attempts,
        rows,
        errors,
        summary,
    };

    if let Some(ref path) = opts.output {
        write_export(path, &export)?;
        eprintln!("Results saved to {}", path.display());
    }
    if opts.save {
        let dir = paths::results_dir()
            .ok_or_else(|| anyhow::anyhow!("cannot determine results directory"))?;
        let path = dir.join(format!(
            "{}-{}.json",
            export.started_at.format("%Y%m%d-%H%M%S"),
            export.run_id
        ));
        write_export(&path, &export)?;
        eprintln!("Results saved to {}", path.display());
    }

    Ok(())
}

/// Single-stage first, then two-stage, pausing in between.
async fn compare(
    orchestrator: &Orchestrator,
    spec: &PromptSpec,
    pause: Duration,
) -> anyhow::Result<(Report, Report)> {
    let single = orchestrator.run(Mode::Single, spec).await?;
    if !pause.is_zero() {
        tokio::time::sleep(pause).await;
    }
    let dual = orchestrator.run(Mode::TwoStage, spec).await?;
    Ok((single, dual))
}

fn write_export(path: &Path, export: &BenchmarkExport) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, serde_json::to_string_pretty(export)?)?;
    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

fn stats_line(label: &str, s: &RunStats) -> String {
    format!(
        "{:<11} {} {:>2} attempt(s) {:>7.2}s ${:.6} {} tokens",
        label,
        if s.passed { "PASS" } else { "FAIL" },
        s.attempts,
        s.time_secs,
        s.cost,
        s.tokens,
    )
}

fn signed_pct(pct: Option<f64>) -> String {
    match pct {
        Some(p) => format!("{:+.1}%", p),
        None => "n/a".into(),
    }
}

pub fn render_summary(s: &BenchmarkSummary) -> String {
    let rule = "=".repeat(60);
    let mut out = String::new();
    out.push_str(&format!("{rule}\nSUMMARY\n{rule}\n"));
    out.push_str(&format!(
        "Tests completed: {} (errors: {})\n\n",
        s.tests_completed, s.tests_errored
    ));
    out.push_str(&format!(
        "Single-stage:  avg time {:.2}s  avg cost ${:.6}  pass rate {:.0}%  avg attempts {:.1}\n",
        s.avg_single_time,
        s.avg_single_cost,
        s.single_pass_rate * 100.0,
        s.avg_single_attempts
    ));
    out.push_str(&format!(
        "Two-stage:     avg time {:.2}s  avg cost ${:.6}  pass rate {:.0}%  avg attempts {:.1}\n\n",
        s.avg_two_stage_time,
        s.avg_two_stage_cost,
        s.two_stage_pass_rate * 100.0,
        s.avg_two_stage_attempts
    ));
    out.push_str(&format!(
        "Time increase: {:+.2}s ({})\n",
        s.time_increase,
        signed_pct(s.time_increase_pct)
    ));
    out.push_str(&format!(
        "Cost increase: {:+.6} USD ({})\n",
        s.cost_increase,
        signed_pct(s.cost_increase_pct)
    ));
    out.push_str(&format!("Total extra cost: ${:.6}", s.total_extra_cost));
    out
}
