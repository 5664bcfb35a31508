//! Selfie QA CLI - live frame quality gating from the command line.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::check::CheckArgs;
use commands::live::LiveArgs;
use commands::{Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: Failed to start async runtime: {e}");
            return ExitCode::Error.into();
        }
    };

    let exit_code = runtime.block_on(dispatch(cli, &config));

    // A pending stdin read cannot be cancelled; don't wait for it.
    runtime.shutdown_background();

    exit_code.into()
}

async fn dispatch(cli: Cli, config: &AppConfig) -> ExitCode {
    match cli.command {
        Some(Commands::Check(args)) => check(CheckArgs::with_config(args, config)).await,
        Some(Commands::Live(args)) => {
            match commands::live::run(&LiveArgs::with_config(args, config)).await {
                Ok(result) => result.exit_code,
                Err(e) => {
                    eprintln!("error: {e:#}");
                    ExitCode::Error
                }
            }
        }
        None => {
            // Default behavior: run check with flattened args
            if cli.check.paths.is_empty() {
                eprintln!("error: No paths specified. Use --help for usage information.");
                return ExitCode::Error;
            }
            check(CheckArgs::with_config(cli.check, config)).await
        }
    }
}

async fn check(args: CheckArgs) -> ExitCode {
    match commands::check::run(&args).await {
        Ok(result) => result.exit_code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error
        }
    }
}
