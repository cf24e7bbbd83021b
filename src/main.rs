mod bridge;
mod cli;
mod commands;
mod format;
mod snapshot;
mod store;
mod toolkit;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let name = cli.command.name();

    if let Err(e) = commands::run(cli) {
        tracing::error!(error = %e, command = name, "command failed");
        eprintln!("cliptk {name}: {e}");
        std::process::exit(1);
    }
}
