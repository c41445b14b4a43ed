//! nbimport CLI: imports gallery notebooks into a playground content tree.
//!
//! Fetches each configured notebook, prepends setup cells, rewrites links to
//! raw-content hosts, and writes the result under the output root.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
