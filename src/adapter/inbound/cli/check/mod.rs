//! Configuration and connection validation command handlers.

pub mod config;
pub mod connection;

use super::command::CheckCommand;
use crate::error::Result;

/// Execute a `check` subcommand.
pub async fn execute(command: &CheckCommand) -> Result<()> {
    match command {
        CheckCommand::Config(args) => config::execute_config(&args.config),
        CheckCommand::Connection(args) => {
            connection::execute_connection(&args.config.config, args.timeout).await
        }
    }
}
