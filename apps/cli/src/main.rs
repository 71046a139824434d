//! sitechat CLI — crawl a website, index it, and chat with it.
//!
//! Ingests a bounded set of same-domain pages into an in-memory vector
//! index and answers questions strictly from the indexed content.

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
