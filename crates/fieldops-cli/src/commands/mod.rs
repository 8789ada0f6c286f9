//! Command implementations

mod analyze;
mod availability;
mod cache;
mod config;
mod insights;
mod normalize;

use crate::cli::{Cli, Commands};
use crate::config_loader::{load_config_with_overrides, overrides_from_flags};
use crate::output::OutputWriter;
use crate::{services, storage};
use anyhow::Result;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    let overrides = overrides_from_flags(cli.timezone.as_deref(), cli.depot.clone(), cli.enhance)?;
    let config = load_config_with_overrides(&cli.config, overrides)?;

    // Commands that never touch storage
    let command = match cli.command {
        Commands::Normalize(args) => return normalize::execute(args, &output),
        Commands::Config => return config::execute(&config, &output),
        command => command,
    };

    let stores = storage::open(cli.storage, cli.data.as_deref()).await?;
    let services = services::build(&stores, &config)?;

    match command {
        Commands::Availability(args) => availability::execute(args, &services, &output).await,
        Commands::Analyze(args) => analyze::execute(args, &services, &output).await,
        Commands::Insights(args) => insights::execute(args, &services, &output).await,
        Commands::Cache(args) => cache::execute(args, &services, &output).await,
        Commands::Normalize(_) | Commands::Config => Ok(()),
    }
}
