//! Knivete CLI - applies versioned SQL scripts to a streaming-SQL server

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

mod banner;
mod cli;
mod commands;
mod logging;

use cli::{Cli, Commands};
use commands::migrate::{self, MigrateSettings};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Migrate(args) => {
            let cwd = std::env::current_dir().context("cannot determine working directory")?;
            let settings = MigrateSettings::resolve(args, &cwd)?;
            logging::init(settings.http_log.as_deref())?;
            migrate::execute(&settings).await
        }
    }
}
