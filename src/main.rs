//! ytrag CLI entry point.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use ytrag::cli::preflight::{self, Operation};
use ytrag::cli::{serve, Cli, Invocation, Output};
use ytrag::config::Settings;
use ytrag::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let invocation = match cli.invocation() {
        Ok(invocation) => invocation,
        Err(e) => Cli::command()
            .error(clap::error::ErrorKind::MissingRequiredArgument, e.to_string())
            .exit(),
    };

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path))),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            return match invocation.failure_output(&e) {
                Some(output) => match Output::result(&output) {
                    Ok(()) => ExitCode::SUCCESS,
                    Err(_) => ExitCode::FAILURE,
                },
                None => {
                    Output::error(&e.to_string());
                    ExitCode::FAILURE
                }
            };
        }
    };

    init_logging(cli.verbose, &settings.general.log_level);

    match run(invocation, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

/// Send tracing output to stderr; stdout is reserved for the result.
fn init_logging(verbose: u8, configured: &str) {
    let log_level = match verbose {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("ytrag={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run(invocation: Invocation, settings: Settings) -> Result<()> {
    match invocation {
        Invocation::Ask { query, video_id } => {
            let output = match preflight::check(Operation::Ask, &settings)
                .and_then(|()| Orchestrator::new(&settings))
            {
                Ok(orchestrator) => {
                    let spinner = Output::spinner("Thinking...");
                    let answer = orchestrator.answer(&query, &video_id).await;
                    spinner.finish_and_clear();
                    answer
                }
                Err(e) => e.to_output(),
            };
            Output::result(&output)?;
        }

        Invocation::ClearCache(target) => {
            preflight::check(Operation::ClearCache, &settings)?;
            let orchestrator = Orchestrator::new(&settings)?;
            Output::result(&orchestrator.clear_cache(&target))?;
        }

        Invocation::Serve { host, port } => {
            preflight::check(Operation::Serve, &settings)?;
            let host = host.unwrap_or_else(|| settings.server.host.clone());
            let port = port.unwrap_or(settings.server.port);
            let orchestrator = Orchestrator::new(&settings)?;
            serve::run_serve(&host, port, orchestrator).await?;
        }
    }

    Ok(())
}
