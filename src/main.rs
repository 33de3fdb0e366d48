use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::{acquire::FetchArgs, config::Config, dashboard::DashboardArgs};

mod acquire;
mod config;
mod dashboard;
mod dataset;
mod error;
mod utils;

/// Finds well reviewed eye hospitals around a city and maps them.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Only show errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Search for venues and save them to the dataset
    Fetch(FetchArgs),
    /// Filter, sort and map a saved dataset
    Dashboard(DashboardArgs),
    /// Check that the configured API key works
    Check,
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_env("ATLAS_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|x| anyhow!("Failed to initialize logging: {x}"))?;

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config = Config::load_with_dotenv().context("Failed to load configuration")?;

    match cli.command {
        Command::Fetch(args) => acquire::main(args, config),
        Command::Dashboard(args) => dashboard::main(args, config),
        Command::Check => acquire::check(config),
    }
}
