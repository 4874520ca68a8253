#![deny(unsafe_code)]

mod auth;
mod exit_code;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use relotag_core::Relocator;
use relotag_core::error::{EnvelopeError, KeySourceError, RelocateError};

use crate::auth::CliKeySource;

/// Relocate a tagging-project tree after it has been moved on disk
#[derive(Parser)]
#[command(name = "relotag")]
#[command(author, version)]
#[command(after_help = "EXAMPLES:
    # Relocate with an interactive key prompt
    relotag ~/projects/holiday

    # Relocate with the key read from a file
    relotag --key-file ~/.keys/holiday ~/projects/holiday
")]
struct Cli {
    /// Destination directory the project tree was moved to
    #[arg(value_name = "DIR")]
    destination: PathBuf,

    /// Read the security key from a file instead of prompting
    #[arg(long, value_name = "PATH")]
    key_file: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(exit_code::SUCCESS),
        Err(e) => {
            let code = categorize_error(&e);

            // Quiet is parsed separately for this path.
            let args: Vec<String> = std::env::args().collect();
            let is_quiet = args.iter().any(|a| a == "-q" || a == "--quiet");
            if !is_quiet {
                eprintln!("Error: {e:#}");
            }

            ExitCode::from(code)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if !cli.quiet {
        setup_tracing(cli.verbose);
    }

    if !cli.destination.exists() {
        anyhow::bail!("destination does not exist: {}", cli.destination.display());
    }
    if !cli.destination.is_dir() {
        anyhow::bail!(
            "destination is not a directory: {}",
            cli.destination.display()
        );
    }

    tracing::info!(
        destination = %cli.destination.display(),
        key_file = cli.key_file.is_some(),
        "starting relocation"
    );

    let key_source = CliKeySource {
        key_file: cli.key_file,
    };
    let summary = Relocator::new(&cli.destination, &key_source)?
        .run()
        .context("relocation failed")?;

    if !cli.quiet {
        println!("Relocated {} item(s)", summary.items);
        println!(
            "  source base: {} -> {}",
            summary.bases.old_source.display(),
            summary.bases.new_source.display()
        );
        println!(
            "  target base: {} -> {}",
            summary.bases.old_target.display(),
            summary.bases.new_target.display()
        );
    }
    Ok(())
}

/// Set up tracing/logging based on verbosity level
fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();
}

/// Map an error chain to an exit code using typed downcasting rather than
/// message matching.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(envelope_err) = cause.downcast_ref::<EnvelopeError>() {
            match envelope_err {
                EnvelopeError::InvalidKeyFormat
                | EnvelopeError::InvalidKey
                | EnvelopeError::InvalidKeyLength { .. } => return exit_code::KEY_INVALID,
                _ => {}
            }
        }

        if cause.downcast_ref::<KeySourceError>().is_some() {
            return exit_code::KEY_INVALID;
        }

        if let Some(relocate_err) = cause.downcast_ref::<RelocateError>()
            && matches!(relocate_err, RelocateError::MissingProject)
        {
            return exit_code::NOT_FOUND;
        }

        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::NotFound => return exit_code::NOT_FOUND,
                io::ErrorKind::Interrupted => return exit_code::CANCELLED,
                _ => {}
            }
        }
    }

    exit_code::GENERAL_ERROR
}
