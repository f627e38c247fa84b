// src/cli/mod.rs — CLI definition (clap derive)

pub mod bench;
pub mod progress;
pub mod run;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::generator::Generator;
use crate::core::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::core::prompts::PromptTemplates;
use crate::core::types::Mode;
use crate::core::validator::Validator;
use crate::evaluator::executor::SandboxExecutor;
use crate::evaluator::sandbox::PythonSandbox;
use crate::infra::config::Config;
use crate::provider::resolver;

#[derive(Parser)]
#[command(
    name = "codegen-bench",
    about = "Benchmark single-stage vs. validated two-stage LLM code generation",
    version
)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Generator model (provider/model format)
    #[arg(long, global = true)]
    pub generator: Option<String>,

    /// Validator model (provider/model format)
    #[arg(long, global = true)]
    pub validator: Option<String>,

    /// Maximum attempts per prompt
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,

    /// Suppress progress output (only emit final result)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one prompt through the retry loop and print the report as JSON
    Run {
        /// single or two-stage
        #[arg(long, default_value = "single")]
        mode: Mode,

        /// Function name the generated code must define
        #[arg(long)]
        function: Option<String>,

        /// JSON file with a list of test cases
        #[arg(long)]
        cases: Option<PathBuf>,

        /// Requirement text
        #[arg(required = true, trailing_var_arg = true)]
        prompt: Vec<String>,
    },
    /// Run every prompt of a bank under both strategies and compare
    Bench {
        /// Prompt bank file (.json or .toml)
        bank: PathBuf,

        /// Write rows and summary as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also save the export under the results directory
        #[arg(long)]
        save: bool,

        /// Only run the first N prompts
        #[arg(long)]
        limit: Option<usize>,

        /// Skip the pauses between provider calls
        #[arg(long)]
        no_pause: bool,
    },
    /// Print the estimated token count of a text
    Estimate {
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
}

/// Fold command-line overrides into the loaded config.
pub fn apply_overrides(cli: &Cli, mut config: Config) -> anyhow::Result<Config> {
    if let Some(ref g) = cli.generator {
        config.models.generator = g.clone();
    }
    if let Some(ref v) = cli.validator {
        config.models.validator = v.clone();
    }
    if let Some(n) = cli.max_attempts {
        config.retry.max_attempts = n;
    }
    config.validate()?;
    Ok(config)
}

/// Wire providers, templates and the Python sandbox into an orchestrator.
/// The validator is attached only when `with_validator` is set.
pub fn build_orchestrator(config: &Config, with_validator: bool) -> anyhow::Result<Orchestrator> {
    let templates = Arc::new(PromptTemplates::new()?);

    let gen_ref = resolver::parse_model_ref(&config.models.generator)?;
    let generator = Generator::new(
        resolver::build_provider(&gen_ref)?,
        gen_ref.model.clone(),
        templates.clone(),
    );

    let sandbox = PythonSandbox::from_config(&config.sandbox)?;
    tracing::debug!(interpreter = %sandbox.interpreter().display(), "using sandbox interpreter");
    let executor = Arc::new(SandboxExecutor::new(Arc::new(sandbox)));

    let mut orchestrator =
        Orchestrator::new(generator, executor, OrchestratorConfig::from_config(config));

    if with_validator {
        let val_ref = resolver::parse_model_ref(&config.models.validator)?;
        let validator = Validator::new(
            resolver::build_provider(&val_ref)?,
            val_ref.model.clone(),
            templates,
        );
        orchestrator = orchestrator.with_validator(validator);
    }

    Ok(orchestrator)
}
