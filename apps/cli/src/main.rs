//! Lectern CLI — offline note-generation pipeline driver.
//!
//! Turns a recorded lecture transcript into structured, timestamped HTML
//! notes, then enriches them with web research and diagram images.

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
