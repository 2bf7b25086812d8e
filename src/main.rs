//! spa-page - Inspect CMS page models for single page applications.

mod cli;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands, inspect};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let configuration = cli::load_configuration(&cli)?;

    match &cli.command {
        Commands::Classify => inspect::run_classify(&configuration),
        Commands::Inspect { args } => inspect::run_inspect(configuration, args).await,
    }
}
