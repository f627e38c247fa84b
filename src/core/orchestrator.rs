// src/core/orchestrator.rs — Bounded generate/validate/test retry loop

use std::sync::Arc;
use std::time::Instant;

use crate::core::cost::{Price, StageMetrics};
use crate::core::generator::Generator;
use crate::core::types::{
    Attempt, AttemptOutcome, Mode, ProgressEvent, PromptSpec, Report, NO_TESTS_MESSAGE,
    REJECTED_SENTINEL,
};
use crate::core::validator::Validator;
use crate::evaluator::executor::CodeExecutor;
use crate::infra::config::Config;
use crate::infra::errors::BenchError;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub max_attempts: u32,
    pub generator_price: Price,
    pub validator_price: Price,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl OrchestratorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.retry.max_attempts,
            generator_price: config.pricing.generator,
            validator_price: config.pricing.validator,
        }
    }
}

/// Where the loop goes after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Passed,
    Retry,
    Exhausted,
}

/// Transition after attempt `attempt` (1-based) of `max_attempts`.
pub fn next_step(passed: bool, attempt: u32, max_attempts: u32) -> Step {
    if passed {
        Step::Passed
    } else if attempt >= max_attempts {
        Step::Exhausted
    } else {
        Step::Retry
    }
}

pub struct Orchestrator {
    generator: Generator,
    validator: Option<Validator>,
    executor: Arc<dyn CodeExecutor>,
    config: OrchestratorConfig,
    on_progress: Option<Box<dyn Fn(ProgressEvent) + Send + Sync>>,
}

impl Orchestrator {
    pub fn new(
        generator: Generator,
        executor: Arc<dyn CodeExecutor>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            generator,
            validator: None,
            executor,
            config,
            on_progress: None,
        }
    }

    /// Enable two-stage mode.
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Set a progress callback for real-time status reporting.
    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    /// Run the retry loop for one prompt.
    ///
    /// Only configuration problems are errors. Generation faults, rejections,
    /// failing tests and exhaustion all come back inside the report.
    pub async fn run(&self, mode: Mode, prompt: &PromptSpec) -> Result<Report, BenchError> {
        if self.config.max_attempts == 0 {
            return Err(BenchError::Config("max_attempts must be at least 1".into()));
        }
        let validator = match mode {
            Mode::Single => None,
            Mode::TwoStage => Some(self.validator.as_ref().ok_or_else(|| {
                BenchError::Config("two-stage mode requires a validator model".into())
            })?),
        };
        Ok(self.run_loop(mode, prompt, validator).await)
    }

    pub async fn run_single(&self, prompt: &PromptSpec) -> Result<Report, BenchError> {
        self.run(Mode::Single, prompt).await
    }

    pub async fn run_two_stage(&self, prompt: &PromptSpec) -> Result<Report, BenchError> {
        self.run(Mode::TwoStage, prompt).await
    }

    async fn run_loop(
        &self,
        mode: Mode,
        prompt: &PromptSpec,
        validator: Option<&Validator>,
    ) -> Report {
        let max_attempts = self.config.max_attempts;
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut final_code = String::new();

        for index in 1..=max_attempts {
            self.emit(ProgressEvent::AttemptStart {
                attempt: index,
                max_attempts,
                mode,
            });

            let attempt = self
                .attempt(index, prompt, validator, &mut final_code)
                .await;

            self.emit(ProgressEvent::AttemptEnd {
                attempt: index,
                passed: attempt.test_passed,
                message: attempt.test_message.clone(),
            });

            let step = next_step(attempt.test_passed, index, max_attempts);
            attempts.push(attempt);
            match step {
                Step::Passed | Step::Exhausted => break,
                Step::Retry => continue,
            }
        }

        let report = Report::from_attempts(mode, prompt.prompt.clone(), attempts, final_code);

        tracing::info!(
            mode = %mode,
            passed = report.passed,
            attempts = report.attempt_count,
            total_cost = report.total_cost,
            "retry loop finished"
        );
        self.emit(ProgressEvent::Complete {
            passed: report.passed,
            attempts: report.attempt_count,
            total_time_secs: report.total_time_secs,
            total_cost: report.total_cost,
        });

        report
    }

    /// One generate, optionally validate, then test cycle. `final_code` is
    /// replaced whenever generation succeeds.
    async fn attempt(
        &self,
        index: u32,
        prompt: &PromptSpec,
        validator: Option<&Validator>,
        final_code: &mut String,
    ) -> Attempt {
        let start = Instant::now();

        let generation = match self
            .generator
            .generate(&prompt.prompt, prompt.required_function())
            .await
        {
            Ok(g) => g,
            Err(e) => {
                tracing::warn!(
                    attempt = index,
                    retriable = e.is_retriable(),
                    "generation failed: {e}"
                );
                return Attempt {
                    index,
                    elapsed_secs: start.elapsed().as_secs_f64(),
                    tokens_in: 0,
                    tokens_out: 0,
                    cost: 0.0,
                    approved: None,
                    validation_reason: None,
                    test_passed: false,
                    test_message: format!("generation failed: {e}"),
                    outcome: AttemptOutcome::GenerationFailed,
                    generation: None,
                    validation: None,
                };
            }
        };

        let gen_metrics = StageMetrics::measure(
            self.generator.model(),
            &self.config.generator_price,
            &generation.rendered_prompt,
            &generation.raw_reply,
            generation.elapsed,
        );
        *final_code = generation.code.clone();

        let mut approved = None;
        let mut validation_reason = None;
        let mut val_metrics = None;

        if let Some(validator) = validator {
            let validation = validator.validate(&prompt.prompt, &generation.code).await;
            val_metrics = Some(StageMetrics::measure(
                validator.model(),
                &self.config.validator_price,
                &validation.rendered_prompt,
                &validation.raw_reply,
                validation.elapsed,
            ));
            self.emit(ProgressEvent::Validated {
                attempt: index,
                approved: validation.verdict.approved,
                reason: validation.verdict.reason.clone(),
            });
            approved = Some(validation.verdict.approved);
            validation_reason = Some(validation.verdict.reason);
        }

        let (test_passed, test_message, outcome) = if approved == Some(false) {
            (false, REJECTED_SENTINEL.to_string(), AttemptOutcome::Rejected)
        } else if prompt.test_cases.is_empty() {
            (true, NO_TESTS_MESSAGE.to_string(), AttemptOutcome::Passed)
        } else {
            let outcome = self
                .executor
                .execute(&generation.code, &prompt.test_cases)
                .await;
            tracing::debug!(attempt = index, passed = outcome.passed, "{}", outcome.message);
            let kind = if outcome.passed {
                AttemptOutcome::Passed
            } else {
                AttemptOutcome::TestFailed
            };
            (outcome.passed, outcome.message, kind)
        };

        let stages = std::iter::once(&gen_metrics).chain(val_metrics.as_ref());
        let (tokens_in, tokens_out, cost) = stages.fold((0, 0, 0.0), |(i, o, c), s| {
            (i + s.tokens_in, o + s.tokens_out, c + s.cost)
        });

        Attempt {
            index,
            elapsed_secs: start.elapsed().as_secs_f64(),
            tokens_in,
            tokens_out,
            cost,
            approved,
            validation_reason,
            test_passed,
            test_message,
            outcome,
            generation: Some(gen_metrics),
            validation: val_metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_step() {
        assert_eq!(next_step(true, 1, 10), Step::Passed);
        assert_eq!(next_step(true, 10, 10), Step::Passed);
        assert_eq!(next_step(false, 1, 10), Step::Retry);
        assert_eq!(next_step(false, 9, 10), Step::Retry);
        assert_eq!(next_step(false, 10, 10), Step::Exhausted);
        assert_eq!(next_step(false, 1, 1), Step::Exhausted);
    }

    #[test]
    fn test_default_config_matches_defaults() {
        let c = OrchestratorConfig::default();
        assert_eq!(c.max_attempts, 10);
        assert_eq!(c.generator_price, Price::FREE);
        assert_eq!(c.validator_price, Price::new(0.15, 0.60));
    }
}
