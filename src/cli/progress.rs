// src/cli/progress.rs — Terminal progress renderer for the retry loop

use crate::core::types::ProgressEvent;

/// Build a progress callback that writes formatted output to stderr.
///
/// All progress output goes to stderr so stdout remains clean for the report.
/// Returns a closure suitable for `Orchestrator::with_progress()`.
pub fn terminal_progress() -> impl Fn(ProgressEvent) + Send + Sync + 'static {
    move |event| eprintln!("{}", format_event(&event))
}

pub fn format_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::AttemptStart {
            attempt,
            max_attempts,
            mode,
        } => format!("[attempt {}/{}] generating ({})...", attempt, max_attempts, mode),
        ProgressEvent::Validated {
            attempt,
            approved,
            reason,
        } => {
            let verdict = if *approved { "approved" } else { "rejected" };
            if reason.is_empty() {
                format!("[attempt {}]   validator: {}", attempt, verdict)
            } else {
                format!("[attempt {}]   validator: {} ({})", attempt, verdict, reason)
            }
        }
        ProgressEvent::AttemptEnd {
            attempt,
            passed,
            message,
        } => {
            let status = if *passed { "PASS" } else { "FAIL" };
            format!("[attempt {}] {} {}", attempt, status, message)
        }
        ProgressEvent::Complete {
            passed,
            attempts,
            total_time_secs,
            total_cost,
        } => format!(
            "[done] passed={} attempts={} time={:.2}s cost=${:.6}",
            passed, attempts, total_time_secs, total_cost,
        ),
    }
}
