use std::process::ExitCode;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use cask_publish::cli::{parse_args, CliOutcome, PublishCli};
use cask_publish::pipeline::{prepare, ReleasePipeline};
use cask_publish::runner::SystemRunner;

fn main() -> ExitCode {
    let cli = match parse_args(std::env::args_os()) {
        Ok(CliOutcome::Run(cli)) => cli,
        Ok(CliOutcome::Info(text)) => {
            print!("{text}");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("[ERROR] {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize tracing
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[ERROR] {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: PublishCli) -> Result<()> {
    let root = std::env::current_dir()?;
    let (options, config, metadata) = prepare(cli, &root)?;

    let runner = SystemRunner::from_process_env(&config.build.env);
    let pipeline = ReleasePipeline::new(options, config, metadata, runner, root);
    pipeline.run()?;

    tracing::info!("Release completed successfully!");
    Ok(())
}
