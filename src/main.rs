// src/main.rs — codegen-bench entry point

use clap::Parser;

use codegen_bench::cli::bench::{run_bench, BenchOptions};
use codegen_bench::cli::run::{load_cases, run_prompt};
use codegen_bench::cli::{apply_overrides, build_orchestrator, Cli, Commands};
use codegen_bench::core::cost::estimate_tokens;
use codegen_bench::core::types::{Mode, PromptSpec};
use codegen_bench::infra::config::Config;
use codegen_bench::infra::logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging (respects RUST_LOG)
    logger::init_logging(logger::level_for(cli.verbose, cli.quiet));

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load config (falls back to defaults if no config.toml)
    let config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };
    let config = apply_overrides(&cli, config)?;

    match cli.command {
        Commands::Estimate { ref text } => {
            println!("{}", estimate_tokens(&text.join(" ")));
            Ok(())
        }
        Commands::Run {
            mode,
            ref function,
            ref cases,
            ref prompt,
        } => {
            let test_cases = match cases {
                Some(path) => load_cases(path)?,
                None => Vec::new(),
            };
            let mut spec = PromptSpec::new(prompt.join(" ")).with_tests(test_cases);
            spec.function = function.clone();

            let orchestrator = build_orchestrator(&config, mode == Mode::TwoStage)?;
            run_prompt(orchestrator, mode, spec, cli.quiet).await
        }
        Commands::Bench {
            ref bank,
            ref output,
            save,
            limit,
            no_pause,
        } => {
            let orchestrator = build_orchestrator(&config, true)?;
            let opts = BenchOptions {
                output: output.clone(),
                save,
                limit,
                no_pause,
                quiet: cli.quiet,
            };
            run_bench(&orchestrator, &config, bank, opts).await
        }
    }
}
