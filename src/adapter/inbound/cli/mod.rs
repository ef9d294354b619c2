//! Command-line adapter: argument parsing, handlers and terminal output.

pub mod check;
pub mod command;
pub mod orders;
pub mod output;
pub mod run;

use std::path::Path;

use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use command::{Cli, Commands};

/// Dispatch a parsed command line to its handler.
///
/// # Errors
///
/// Returns the first error raised by the handler.
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run::execute(&args).await,
        Commands::Orders(command) => orders::execute(&command).await,
        Commands::Check(command) => check::execute(&command).await,
    }
}

/// Load the configuration for a one-shot command.
///
/// Logging stays at `warn` unless raised with `-v` (`info`) or `-vv`
/// (`debug`); `RUST_LOG` still overrides both.
pub(crate) fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load(path)?;
    let level = match output::verbosity() {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    config.logging.with_level(level).init();
    Ok(config)
}
