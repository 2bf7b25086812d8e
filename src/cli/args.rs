//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Inspect CMS page models for an SPA configuration
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, `.toml` or `.json` (default: spa.toml)
    #[arg(short = 'C', long, global = true, default_value = "spa.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Request path to resolve, overriding the configured one
    #[arg(short, long, global = true)]
    pub path: Option<String>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the protocol and effective options a configuration resolves to
    #[command(visible_alias = "c")]
    Classify,

    /// Fetch or load a page model and print its component tree
    #[command(visible_alias = "i")]
    Inspect {
        #[command(flatten)]
        args: InspectArgs,
    },
}

/// Inspect command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct InspectArgs {
    /// Read the page model from a JSON file instead of fetching it
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub model: Option<PathBuf>,

    /// Print the component tree as JSON
    #[arg(long)]
    pub json: bool,
}
