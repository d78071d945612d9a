mod cli;
mod commands;
mod config;
mod target;

use clap::Parser;
use eyre::Result;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::{
    handle_config_command, handle_delete_command, handle_list_command, handle_publish_command,
    handle_reset_command, handle_serve_command, handle_validate_command,
};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = Config::load().await?;

    match cli.command {
        Commands::Publish { form, target, json } => {
            handle_publish_command(form, target, json, &config).await
        }
        Commands::Validate { form, target } => {
            handle_validate_command(form, target, &config).await
        }
        Commands::Delete {
            app_id,
            force,
            target,
        } => handle_delete_command(app_id, force, target, &config).await,
        Commands::Reset { force, target } => handle_reset_command(force, target, &config).await,
        Commands::List {
            search,
            json,
            target,
        } => handle_list_command(search, json, target, &config).await,
        Commands::Serve {
            port,
            root,
            web_root,
        } => handle_serve_command(port, root, web_root, &config).await,
        Commands::Config { command } => handle_config_command(command).await,
    }
}
