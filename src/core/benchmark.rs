// src/core/benchmark.rs — Single-stage vs. two-stage comparison rows and summary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::Report;

/// The numbers kept from one strategy's report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub passed: bool,
    pub attempts: u32,
    pub time_secs: f64,
    pub tokens: u64,
    pub cost: f64,
}

impl From<&Report> for RunStats {
    fn from(report: &Report) -> Self {
        Self {
            passed: report.passed,
            attempts: report.attempt_count,
            time_secs: report.total_time_secs,
            tokens: report.total_tokens,
            cost: report.total_cost,
        }
    }
}

/// One prompt run under both strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRow {
    pub id: String,
    pub prompt: String,
    pub single: RunStats,
    pub two_stage: RunStats,
    pub cost_increase: f64,
    pub time_increase: f64,
}

impl BenchmarkRow {
    pub fn new(id: impl Into<String>, single: &Report, two_stage: &Report) -> Self {
        let single = RunStats::from(single);
        let dual = RunStats::from(two_stage);
        Self {
            id: id.into(),
            prompt: two_stage.prompt.clone(),
            cost_increase: dual.cost - single.cost,
            time_increase: dual.time_secs - single.time_secs,
            single,
            two_stage: dual,
        }
    }
}

/// A prompt that could not be compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptError {
    pub id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    pub tests_completed: usize,
    pub tests_errored: usize,
    pub avg_single_time: f64,
    pub avg_two_stage_time: f64,
    pub time_increase: f64,
    /// `None` when the single-stage baseline is zero.
    pub time_increase_pct: Option<f64>,
    pub avg_single_cost: f64,
    pub avg_two_stage_cost: f64,
    pub cost_increase: f64,
    pub cost_increase_pct: Option<f64>,
    pub total_extra_cost: f64,
    pub single_pass_rate: f64,
    pub two_stage_pass_rate: f64,
    pub avg_single_attempts: f64,
    pub avg_two_stage_attempts: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

fn percent(increase: f64, baseline: f64) -> Option<f64> {
    (baseline > 0.0).then(|| increase / baseline * 100.0)
}

pub fn summarize(rows: &[BenchmarkRow], errored: usize) -> BenchmarkSummary {
    let avg_single_time = mean(rows.iter().map(|r| r.single.time_secs));
    let avg_two_stage_time = mean(rows.iter().map(|r| r.two_stage.time_secs));
    let avg_single_cost = mean(rows.iter().map(|r| r.single.cost));
    let avg_two_stage_cost = mean(rows.iter().map(|r| r.two_stage.cost));
    let passed = |f: fn(&BenchmarkRow) -> bool| mean(rows.iter().map(|r| f(r) as u8 as f64));

    BenchmarkSummary {
        tests_completed: rows.len(),
        tests_errored: errored,
        avg_single_time,
        avg_two_stage_time,
        time_increase: avg_two_stage_time - avg_single_time,
        time_increase_pct: percent(avg_two_stage_time - avg_single_time, avg_single_time),
        avg_single_cost,
        avg_two_stage_cost,
        cost_increase: avg_two_stage_cost - avg_single_cost,
        cost_increase_pct: percent(avg_two_stage_cost - avg_single_cost, avg_single_cost),
        total_extra_cost: rows.iter().fold(0.0, |acc, r| acc + r.cost_increase),
        single_pass_rate: passed(|r| r.single.passed),
        two_stage_pass_rate: passed(|r| r.two_stage.passed),
        avg_single_attempts: mean(rows.iter().map(|r| r.single.attempts as f64)),
        avg_two_stage_attempts: mean(rows.iter().map(|r| r.two_stage.attempts as f64)),
    }
}

/// Everything written by `bench --output`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkExport {
    pub run_id: uuid::Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub generator: String,
    pub validator: String,
    pub max_attempts: u32,
    pub rows: Vec<BenchmarkRow>,
    pub errors: Vec<PromptError>,
    pub summary: BenchmarkSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Mode;
    use pretty_assertions::assert_eq;

    fn report(mode: Mode, passed: bool, attempts: u32, time: f64, cost: f64) -> Report {
        Report {
            mode,
            prompt: "p".into(),
            passed,
            attempt_count: attempts,
            total_time_secs: time,
            total_tokens: 100,
            total_cost: cost,
            attempts: vec![],
            final_code: String::new(),
        }
    }

    #[test]
    fn test_row_increases() {
        let row = BenchmarkRow::new(
            "1",
            &report(Mode::Single, true, 1, 2.0, 0.0),
            &report(Mode::TwoStage, true, 2, 5.0, 0.0003),
        );
        assert!((row.time_increase - 3.0).abs() < 1e-9);
        assert!((row.cost_increase - 0.0003).abs() < 1e-12);
        assert_eq!(row.two_stage.attempts, 2);
    }

    #[test]
    fn test_summary_averages() {
        let rows = vec![
            BenchmarkRow::new(
                "1",
                &report(Mode::Single, true, 1, 2.0, 0.001),
                &report(Mode::TwoStage, true, 1, 4.0, 0.003),
            ),
            BenchmarkRow::new(
                "2",
                &report(Mode::Single, false, 10, 4.0, 0.003),
                &report(Mode::TwoStage, true, 3, 6.0, 0.005),
            ),
        ];
        let s = summarize(&rows, 1);
        assert_eq!(s.tests_completed, 2);
        assert_eq!(s.tests_errored, 1);
        assert!((s.avg_single_time - 3.0).abs() < 1e-9);
        assert!((s.avg_two_stage_time - 5.0).abs() < 1e-9);
        assert!((s.time_increase_pct.unwrap() - 66.666_666).abs() < 1e-3);
        assert!((s.avg_single_cost - 0.002).abs() < 1e-12);
        assert!((s.cost_increase_pct.unwrap() - 100.0).abs() < 1e-6);
        assert!((s.total_extra_cost - 0.004).abs() < 1e-12);
        assert!((s.single_pass_rate - 0.5).abs() < 1e-9);
        assert!((s.two_stage_pass_rate - 1.0).abs() < 1e-9);
        assert!((s.avg_single_attempts - 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_summary_zero_baseline_has_no_percentage() {
        let rows = vec![BenchmarkRow::new(
            "1",
            &report(Mode::Single, true, 1, 1.0, 0.0),
            &report(Mode::TwoStage, true, 1, 2.0, 0.0001),
        )];
        let s = summarize(&rows, 0);
        assert_eq!(s.cost_increase_pct, None);
        assert!(s.time_increase_pct.is_some());
    }

    #[test]
    fn test_summary_empty() {
        let s = summarize(&[], 3);
        assert_eq!(s.tests_completed, 0);
        assert_eq!(s.avg_single_time, 0.0);
        assert_eq!(s.time_increase_pct, None);
        assert_eq!(s.single_pass_rate, 0.0);
        assert!(s.total_extra_cost.is_sign_positive());
        assert!(s.cost_increase.is_sign_positive());
        assert!(s.time_increase.is_sign_positive());
    }
}
