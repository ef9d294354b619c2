use clap::Parser;
use ordersync::adapter::inbound::cli::command::Cli;
use ordersync::adapter::inbound::cli::output::{self, OutputConfig};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // One process-wide crypto provider for both rustls users.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    output::configure(
        OutputConfig::new(cli.json, cli.quiet, cli.verbose),
        cli.color,
    );

    if let Err(e) = ordersync::adapter::inbound::cli::execute(cli).await {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
