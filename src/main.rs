use anyhow::Result;
use clap::Parser;

use statewalker_cli::cli::{self, commands::Cli, runtime};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    runtime::init_logging(&args.log_level, args.debug)?;
    cli::dispatch(args).await
}
