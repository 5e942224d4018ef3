//! tfinventory CLI entry point.
//!
//! This binary is meant to be used directly as an Ansible dynamic-inventory
//! script. The inventory goes to stdout; logs go to stderr.

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;
use tfinventory::cli::Cli;
use tfinventory::config::DEFAULT_CONFIG_FILES;
use tfinventory::{Config, InventoryBuilder, TfInventoryError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbosity(), cli.quiet);

    match run(&cli) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");

            eprintln!("Error: {e}");

            // Print error chain (cause chain)
            let mut source = e.source();
            if source.is_some() {
                eprintln!("\nCaused by:");
                let mut i = 0;
                while let Some(cause) = source {
                    eprintln!("  {i}: {cause}");
                    source = cause.source();
                    i += 1;
                }
            }

            let code = e
                .downcast_ref::<TfInventoryError>()
                .map_or(1, TfInventoryError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        // RUST_LOG wins over the verbose flag
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let base_level = match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            EnvFilter::new(format!("warn,tfinventory={base_level}"))
        })
    };

    // stdout carries the inventory, so logs must go to stderr
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(filter)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    tracing::debug!("Loading configuration");
    let mut config = load_config(cli)?;
    config.merge_cli_args(cli);
    config.validate()?;
    tracing::debug!(state = %config.state.display(), format = %config.output.format, "Configuration resolved");

    let builder = InventoryBuilder::new(config);
    let inventory = builder.build()?;

    if inventory.has_warnings() {
        tracing::warn!(count = inventory.warnings.len(), "Some resources or lines were skipped");
    }

    let output = builder.render(&inventory, &cli.mode())?;
    println!("{output}");

    Ok(ExitCode::SUCCESS)
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    // Check for explicit config file
    if let Some(ref config_path) = cli.config {
        tracing::debug!(path = %config_path.display(), "Loading configuration from explicit path");
        return Ok(read_config(config_path)?);
    }

    tracing::debug!("Searching for default configuration files");
    for path in DEFAULT_CONFIG_FILES {
        let path = Path::new(path);
        if path.exists() {
            tracing::debug!(path = %path.display(), "Found configuration file");
            return Ok(read_config(path)?);
        }
    }

    tracing::debug!("No configuration file found, using default configuration");
    Ok(Config::default())
}

fn read_config(path: &Path) -> tfinventory::Result<Config> {
    use tfinventory::error::ResultExt;

    let content = std::fs::read_to_string(path).with_path(path)?;
    Config::from_yaml(&content)
}
