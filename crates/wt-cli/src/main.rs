use std::io::Write;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wt_cli::commands::{intervals, report, schedule};
use wt_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let now = Local::now().fixed_offset();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Report { range, by, json } => {
            report::run(&mut out, &config, range, *by, *json, now)?;
        }
        Commands::Intervals { range, json } => {
            intervals::run(&mut out, &config, range, *json, now)?;
        }
        Commands::Schedule => {
            schedule::run(&mut out, &config)?;
        }
    }

    out.flush()?;
    Ok(())
}
