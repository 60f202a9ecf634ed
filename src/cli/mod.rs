//! Command-line surface.

pub mod commands;
pub mod explore;
pub mod inspect;
pub mod runtime;

use anyhow::Result;

use crate::config::Config;
use commands::{Cli, Commands};

pub async fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_ref())?;
    match cli.command {
        Commands::Explore(args) => explore::run(args, config).await,
        Commands::Resume(args) => explore::resume(args, config).await,
        Commands::Inspect(args) => inspect::run(args),
    }
}
