use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod format;
mod style;
mod util;

use cli::{Cli, Commands};
use commands::{ScanArgs, cmd_config, cmd_doctor, cmd_scan, cmd_services};
use config::{Config, DEFAULT_TIMEOUT_SECS, resolve_format, resolve_service, resolve_timeout};

#[tokio::main]
async fn main() -> Result<()> {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "blescan", &mut io::stdout());
        return Ok(());
    }

    // Initialize tracing
    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = Config::load();
    let no_color = cli.no_color || config.no_color;
    let output = cli.output.as_ref();

    match cli.command {
        Commands::Scan {
            timeout,
            service,
            all,
            format,
            compact,
        } => {
            let args = ScanArgs {
                timeout: resolve_timeout(timeout, &config, DEFAULT_TIMEOUT_SECS),
                service: resolve_service(service, all, &config)?,
                format: resolve_format(format, &config),
                compact,
            };
            tracing::debug!(?args, "Starting scan");
            cmd_scan(&args, output, cli.quiet, no_color).await?;
        }
        Commands::Doctor => cmd_doctor(cli.verbose, no_color).await?,
        Commands::Config { action } => cmd_config(action, cli.quiet, no_color)?,
        Commands::Services { format } => cmd_services(format, output, no_color)?,
        Commands::Completions { .. } => {
            // Already handled above
            unreachable!()
        }
    }

    Ok(())
}
