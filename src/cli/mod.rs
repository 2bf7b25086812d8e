//! Command-line interface module.

mod args;
pub mod inspect;

pub use args::{Cli, Commands, InspectArgs};

use anyhow::{Context, Result};
use spa_page::Configuration;

/// Load the configuration named on the command line and apply overrides.
///
/// A missing default config file means an empty configuration.
pub fn load_configuration(cli: &Cli) -> Result<Configuration> {
    let mut configuration = if cli.config.exists() {
        Configuration::load(&cli.config)
            .with_context(|| format!("failed to load `{}`", cli.config.display()))?
    } else if cli.config.as_os_str() == "spa.toml" {
        Configuration::default()
    } else {
        anyhow::bail!("config file `{}` not found", cli.config.display());
    };

    if let Some(path) = &cli.path {
        configuration = configuration.with_path(path.clone());
    }
    if cli.verbose {
        configuration.debug = true;
    }
    Ok(configuration)
}
