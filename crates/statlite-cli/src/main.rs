mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use statlite_core::Envelope;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, LogLevel};
use crate::error::CliError;

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(error.exit_code());
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    let output = commands::run(&cli)?;
    output::render(&output, cli.format, cli.pretty)?;

    if cli.strict {
        enforce_strict(&output.envelope)?;
    }

    Ok(())
}

/// Strict mode turns any warning or page error into a failure.
fn enforce_strict<T>(envelope: &Envelope<T>) -> Result<(), CliError> {
    let warning_count = envelope.meta.warnings.len();
    let error_count = envelope.errors.len();
    if warning_count > 0 || error_count > 0 {
        return Err(CliError::StrictModeViolation {
            warning_count,
            error_count,
        });
    }
    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(level: Option<LogLevel>) {
    let filter = match level {
        Some(level) => EnvFilter::new(format!(
            "statlite_cli={level},statlite_core={level},statlite_warehouse={level}",
            level = level.as_str()
        )),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
