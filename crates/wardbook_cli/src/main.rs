//! `wardbook` command-line entry point.
//!
//! Opens the configured store, runs one operation and prints the resulting
//! record(s) as JSON.

use clap::Parser;

mod cli;
mod commands;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    commands::run_command(cli).await
}
