//! CLI module for the config registry
//!
//! Provides subcommands:
//! - `serve`: run the registry HTTP API (default)
//! - `check-config`: print the resolved configuration and exit

pub mod serve;

use clap::{Parser, Subcommand};

/// Config Registry - versioned configs and label-addressable config groups
#[derive(Parser)]
#[command(name = "config-registry")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the registry HTTP API
    Serve(serve::ServeArgs),

    /// Load the configuration, print it and exit
    CheckConfig,
}

/// Prints the configuration as it would be used by `serve`
pub fn check_config() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = crate::AppConfig::load()?;
    config.storage.storage_config()?;
    config.observability.validate()?;

    println!("{:#?}", config);
    Ok(())
}
