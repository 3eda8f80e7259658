//! `devcell` application entry point.
//!
//! The binary acquires one session's sandbox, performs a single operation and
//! prints the JSON outcome on stdout. It uses `eyre` for opaque error handling
//! at the application boundary; operation failures are reported in the JSON
//! payload and through a non-zero exit code instead.
//!
//! Configuration is loaded with layered precedence via `OrthoConfig`:
//! 1. Application defaults
//! 2. Configuration file (`~/.config/devcell/config.toml` or path from `DEVCELL_CONFIG_PATH`)
//! 3. Environment variables (`DEVCELL_*`)
//! 4. Command-line arguments
//!
//! Logs go to stderr, filtered by `DEVCELL_LOG` (default `info`).

use std::process::ExitCode;

use clap::Parser;
use devcell::api::{Operation, OperationOutput, open_orchestrator, perform};
use devcell::config::{AppConfig, Cli, Commands, load_config};
use devcell::error::{ContainerError, Result as DevcellResult};
use eyre::{Report, Result as EyreResult};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
const LOG_ENV_VAR: &str = "DEVCELL_LOG";

/// Application entry point.
///
/// Uses `eyre::Result` as the return type to provide human-readable error
/// reports for failures that happen before an outcome exists, such as
/// configuration or engine connection errors.
fn main() -> EyreResult<ExitCode> {
    init_tracing();

    // Parse CLI first (for subcommand dispatch and global options).
    let cli = Cli::parse();

    // Load configuration with layered precedence: defaults < file < env < CLI.
    let config = load_config(&cli).map_err(Report::from)?;

    let runtime = tokio::runtime::Runtime::new().map_err(|error| {
        Report::from(ContainerError::RuntimeCreationFailed {
            message: error.to_string(),
        })
    })?;

    let output = runtime
        .block_on(run(&cli, &config))
        .map_err(Report::from)?;
    print_output(&output)?;

    Ok(if output.succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Open the session, then acquire and perform the requested operation.
async fn run(cli: &Cli, config: &AppConfig) -> DevcellResult<OperationOutput> {
    let env = mockable::DefaultEnv::new();
    let mut orchestrator = open_orchestrator(config, cli.command.session(), &env).await?;
    perform(&mut orchestrator, &operation_for(&cli.command)).await
}

/// Translate a parsed subcommand into a library-owned operation.
fn operation_for(command: &Commands) -> Operation {
    match command {
        Commands::Acquire(_) => Operation::Acquire,
        Commands::Ls(args) => Operation::List {
            path: args.path.clone(),
        },
        Commands::Read(args) => Operation::Read {
            path: args.path.clone(),
            annotated: args.annotated,
        },
        Commands::Write(args) => Operation::Write {
            path: args.path.clone(),
            kind: args.kind.clone(),
            content: args.content.clone(),
        },
        Commands::Rm(args) => Operation::Delete {
            path: args.path.clone(),
        },
        Commands::Search(args) => Operation::Search {
            term: args.term.clone(),
        },
        Commands::Replace(args) => Operation::Replace {
            path: args.path.clone(),
            search: args.search.clone(),
            replace: args.replace.clone(),
        },
        Commands::Mv(args) => Operation::Move {
            source: args.source.clone(),
            destination: args.destination.clone(),
        },
        Commands::Run(args) => Operation::Run {
            command: args.command.join(" "),
        },
        Commands::Lint(_) => Operation::Lint,
        Commands::Logs(args) => Operation::Logs { lines: args.lines },
    }
}

#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
fn print_output(output: &OperationOutput) -> EyreResult<()> {
    let rendered = serde_json::to_string_pretty(&output.payload)?;
    println!("{rendered}");
    Ok(())
}
