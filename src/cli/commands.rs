//! Argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "statewalker",
    version,
    about = "Systematic state-graph exploration for stateful interactive applications"
)]
pub struct Cli {
    /// Path to a YAML config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Shortcut for --log-level debug.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Explore a scripted site model and report the discovered state graph.
    Explore(ExploreArgs),
    /// Resume a persisted session against the same site script.
    Resume(ResumeArgs),
    /// Inspect a persisted session snapshot.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct ResumeArgs {
    /// Site script (YAML) the snapshot was taken against.
    pub script: PathBuf,

    /// Snapshot file to resume from.
    pub snapshot: PathBuf,

    /// Emit the final report as JSON instead of a summary line.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ExploreArgs {
    /// Site script (YAML) describing the application under exploration.
    pub script: PathBuf,

    /// Snapshot file for checkpointing; overrides the config value.
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Resume from the snapshot file when it holds a usable session.
    #[arg(long)]
    pub resume: bool,

    /// Safety policy: read_only, exploration_only, or full_testing.
    #[arg(long)]
    pub policy: Option<String>,

    /// Override the total action budget.
    #[arg(long)]
    pub max_actions: Option<u64>,

    /// Override the recursion depth cap.
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Pin exploration to the root URL's path.
    #[arg(long)]
    pub pin_scope: bool,

    /// Emit the final report as JSON instead of a summary line.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Snapshot file to inspect.
    pub snapshot: PathBuf,

    /// Emit the full snapshot as JSON.
    #[arg(long)]
    pub json: bool,
}
